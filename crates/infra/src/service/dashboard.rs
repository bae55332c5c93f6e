use serde::Serialize;
use serde_json::Value as JsonValue;

use relieftrack_core::{OrganizationId, Record, ShipmentId, WarehouseId};
use relieftrack_events::{EventBus, EventEnvelope};
use relieftrack_inventory::InventoryStatistics;
use relieftrack_shipments::{Priority, Shipment, ShipmentStatistics, ShipmentStatus};
use relieftrack_warehouses::{CapacityStatus, Warehouse, WarehouseStatistics, WarehouseStatus};

use super::{LogisticsService, ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseMarker {
    pub id: WarehouseId,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: WarehouseStatus,
    pub utilization: u8,
    pub capacity_status: CapacityStatus,
}

impl WarehouseMarker {
    fn from_warehouse(w: &Warehouse) -> Option<Self> {
        let (latitude, longitude) = w.coordinates()?;
        Some(Self {
            id: w.id(),
            location: w.location().to_string(),
            latitude,
            longitude,
            status: w.status(),
            utilization: w.utilization(),
            capacity_status: w.capacity_status(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentMarker {
    pub id: ShipmentId,
    pub tracking_number: String,
    pub destination: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ShipmentStatus,
    pub priority: Priority,
}

impl ShipmentMarker {
    fn from_shipment(s: &Shipment) -> Option<Self> {
        if !s.is_open() {
            return None;
        }
        let point = s.coordinates()?;
        Some(Self {
            id: s.id(),
            tracking_number: s.tracking_number().to_string(),
            destination: s.destination().to_string(),
            latitude: point.latitude,
            longitude: point.longitude,
            status: s.status(),
            priority: s.priority(),
        })
    }
}

/// Map markers plus headline figures for one organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub warehouses: Vec<WarehouseMarker>,
    /// Open shipments that report a position.
    pub shipments: Vec<ShipmentMarker>,
    pub inventory_stats: InventoryStatistics,
    pub shipment_stats: ShipmentStatistics,
    pub warehouse_stats: WarehouseStatistics,
}

impl<B> LogisticsService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn dashboard_summary(
        &self,
        organization_id: OrganizationId,
    ) -> Result<DashboardSummary, ServiceError> {
        let warehouses = self.stores.warehouses.list(organization_id)?;
        let shipments = self.stores.shipments.list(organization_id)?;
        let items = self.stores.inventory.list(organization_id)?;

        Ok(DashboardSummary {
            warehouses: warehouses.iter().filter_map(WarehouseMarker::from_warehouse).collect(),
            shipments: shipments.iter().filter_map(ShipmentMarker::from_shipment).collect(),
            inventory_stats: InventoryStatistics::compute(&items),
            shipment_stats: ShipmentStatistics::compute(&shipments),
            warehouse_stats: WarehouseStatistics::compute(&warehouses),
        })
    }
}
