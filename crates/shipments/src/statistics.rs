use serde::Serialize;

use crate::shipment::{Priority, Shipment, ShipmentStatus};

/// Per-status and priority counts over a set of shipments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShipmentStatistics {
    pub total_shipments: u64,
    pub pending_count: u64,
    pub in_transit_count: u64,
    pub delivered_count: u64,
    pub delayed_count: u64,
    pub cancelled_count: u64,
    pub high_priority_count: u64,
    pub critical_priority_count: u64,
}

impl ShipmentStatistics {
    pub fn compute<'a>(shipments: impl IntoIterator<Item = &'a Shipment>) -> Self {
        let mut stats = Self::default();
        for shipment in shipments {
            stats.total_shipments += 1;
            match shipment.status() {
                ShipmentStatus::Pending => stats.pending_count += 1,
                ShipmentStatus::InTransit => stats.in_transit_count += 1,
                ShipmentStatus::Delivered => stats.delivered_count += 1,
                ShipmentStatus::Delayed => stats.delayed_count += 1,
                ShipmentStatus::Cancelled => stats.cancelled_count += 1,
            }
            match shipment.priority() {
                Priority::High => stats.high_priority_count += 1,
                Priority::Critical => stats.critical_priority_count += 1,
                Priority::Low | Priority::Medium => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::{CreateShipment, LineItem, tracking_number};
    use chrono::Utc;
    use relieftrack_core::{InventoryItemId, OrganizationId, ShipmentId, WarehouseId};

    fn shipment(priority: Priority) -> Shipment {
        let id = ShipmentId::new();
        let now = Utc::now();
        Shipment::create(CreateShipment {
            organization_id: OrganizationId::new(),
            shipment_id: id,
            tracking_number: tracking_number(id, now),
            source_warehouse_id: WarehouseId::new(),
            destination: "Field clinic".into(),
            line_items: vec![LineItem {
                inventory_item_id: InventoryItemId::new(),
                quantity: 1,
                description: None,
            }],
            priority,
            coordinates: None,
            estimated_delivery: None,
            notes: None,
            created_by: None,
            occurred_at: now,
        })
        .unwrap()
        .0
    }

    #[test]
    fn counts_statuses_and_priorities() {
        let a = shipment(Priority::Critical);
        let (b, _) = shipment(Priority::High)
            .set_status(ShipmentStatus::Delivered, None, Utc::now())
            .unwrap();
        let c = shipment(Priority::Low);

        let stats = ShipmentStatistics::compute([&a, &b, &c]);

        assert_eq!(stats.total_shipments, 3);
        assert_eq!(stats.pending_count, 2);
        assert_eq!(stats.delivered_count, 1);
        assert_eq!(stats.high_priority_count, 1);
        assert_eq!(stats.critical_priority_count, 1);
    }
}
