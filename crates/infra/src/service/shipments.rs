use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use relieftrack_core::{
    DomainError, ExpectedVersion, InventoryItemId, OrganizationId, Record, ShipmentId, UserId,
    WarehouseId,
};
use relieftrack_events::{EventBus, EventEnvelope};
use relieftrack_inventory::{InventoryEvent, InventoryItem, UpdateCause};
use relieftrack_shipments::{
    CreateShipment, GeoPoint, LineItem, Priority, Shipment, ShipmentStatistics, ShipmentStatus,
    requested_quantities, tracking_number,
};
use relieftrack_warehouses::Warehouse;

use super::{LogisticsService, ServiceError, not_found};
use crate::record_store::StoreError;

/// Shipment request as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewShipment {
    pub source_warehouse_id: WarehouseId,
    pub destination: String,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub priority: Option<Priority>,
}

impl ShipmentFilter {
    fn matches(&self, shipment: &Shipment) -> bool {
        self.status.is_none_or(|s| shipment.status() == s)
            && self.priority.is_none_or(|p| shipment.priority() == p)
    }
}

/// Inventory records written by one batch, each with its unpublished event.
type StockWrites = Vec<(InventoryItem, InventoryEvent)>;

fn signed(quantity: u64) -> Result<i64, DomainError> {
    i64::try_from(quantity).map_err(|_| DomainError::validation("quantity is too large"))
}

impl<B> LogisticsService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Reserve stock for every line item and create a `pending` shipment.
    ///
    /// All-or-nothing: every line item is checked against the summed
    /// requested quantity before any item is written, and the reservation is
    /// applied as one atomic batch. Inventory events are published before
    /// `shipment.created`.
    pub fn create_shipment(
        &self,
        organization_id: OrganizationId,
        request: NewShipment,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Shipment, ServiceError> {
        let shipment_id = ShipmentId::new();
        let source = request.source_warehouse_id;

        let prepared = requested_quantities(&request.line_items).and_then(|requested| {
            let created = Shipment::create(CreateShipment {
                organization_id,
                shipment_id,
                tracking_number: tracking_number(shipment_id, now),
                source_warehouse_id: source,
                destination: request.destination,
                line_items: request.line_items,
                priority: request.priority,
                coordinates: request.coordinates,
                estimated_delivery: request.estimated_delivery,
                notes: request.notes,
                created_by,
                occurred_at: now,
            })?;
            Ok((requested, created))
        });
        let (requested, (shipment, created)) = self.checked("create_shipment", prepared)?;

        let keys = std::iter::once(Self::key::<Warehouse>(organization_id, source)).chain(
            requested
                .keys()
                .map(|id| Self::key::<InventoryItem>(organization_id, *id)),
        );
        let _guard = self.locks.acquire(keys);

        let reserved = self.with_retries("create_shipment", || {
            if self.stores.warehouses.get(organization_id, source)?.is_none() {
                return Err(DomainError::item_not_found(format!("warehouse {source}")).into());
            }

            let mut batch = Vec::with_capacity(requested.len());
            let mut events = Vec::with_capacity(requested.len());
            for (item_id, quantity) in &requested {
                let item = self
                    .stores
                    .inventory
                    .get(organization_id, *item_id)?
                    .filter(|item| item.warehouse_id() == source)
                    .ok_or_else(|| {
                        DomainError::item_not_found(format!(
                            "inventory item {item_id} in warehouse {source}"
                        ))
                    })?;
                item.ensure_reservable(*quantity)?;
                let (next, event) = item.adjust_quantity(
                    -signed(*quantity)?,
                    UpdateCause::Reservation { shipment_id },
                    now,
                )?;
                batch.push((next, ExpectedVersion::Exact(item.version())));
                events.push(event);
            }

            let stored = self.stores.inventory.update_batch(batch)?;
            Ok(stored.into_iter().zip(events).collect::<Vec<_>>())
        })?;

        let shipment = match self.stores.shipments.insert(shipment) {
            Ok(shipment) => shipment,
            Err(err) => {
                self.release_unpublished(&reserved, &requested, shipment_id, now);
                return Err(err.into());
            }
        };

        for (item, event) in &reserved {
            self.publish_item(item, event)?;
        }
        self.publish(
            organization_id,
            shipment_id,
            Shipment::KIND,
            shipment.version(),
            &created,
        )?;

        info!(
            organization_id = %organization_id,
            shipment_id = %shipment_id,
            tracking_number = shipment.tracking_number(),
            line_items = requested.len(),
            "shipment created"
        );
        Ok(shipment)
    }

    /// Undo a reservation whose shipment could not be stored.
    fn release_unpublished(
        &self,
        reserved: &[(InventoryItem, InventoryEvent)],
        requested: &BTreeMap<InventoryItemId, u64>,
        shipment_id: ShipmentId,
        now: DateTime<Utc>,
    ) {
        let result = self.revert_unpublished(
            reserved,
            requested,
            1,
            UpdateCause::ReservationReleased { shipment_id },
            now,
        );
        if let Err(err) = result {
            error!(
                shipment_id = %shipment_id,
                error = %err,
                "failed to release reservation after shipment insert failure"
            );
        }
    }

    /// Take back stock restored for a cancellation that could not be stored.
    fn reserve_unpublished(
        &self,
        restored: &[(InventoryItem, InventoryEvent)],
        requested: &BTreeMap<InventoryItemId, u64>,
        shipment_id: ShipmentId,
        now: DateTime<Utc>,
    ) {
        let result = self.revert_unpublished(
            restored,
            requested,
            -1,
            UpdateCause::Reservation { shipment_id },
            now,
        );
        if let Err(err) = result {
            error!(
                shipment_id = %shipment_id,
                error = %err,
                "failed to re-reserve stock after cancellation write failure"
            );
        }
    }

    /// Apply `sign * requested quantity` to every item of an unpublished batch.
    fn revert_unpublished(
        &self,
        applied: &[(InventoryItem, InventoryEvent)],
        requested: &BTreeMap<InventoryItemId, u64>,
        sign: i64,
        cause: UpdateCause,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if applied.is_empty() {
            return Ok(());
        }
        let batch = applied
            .iter()
            .map(|(item, _)| {
                let quantity = requested.get(&item.id()).copied().unwrap_or_default();
                let (next, _) = item.adjust_quantity(sign * signed(quantity)?, cause, now)?;
                Ok((next, ExpectedVersion::Exact(item.version())))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        self.stores.inventory.update_batch(batch)?;
        Ok(())
    }

    /// Move a shipment to `new_status`.
    ///
    /// Entering `cancelled` returns every reserved quantity to stock. The
    /// stock is restored before the shipment is written; if that write fails
    /// the restore is taken back, so a shipment is never cancelled without
    /// its stock. Nothing is published until both writes succeed, then the
    /// shipment event goes out before the inventory events.
    pub fn set_shipment_status(
        &self,
        organization_id: OrganizationId,
        shipment_id: ShipmentId,
        new_status: ShipmentStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Shipment, ServiceError> {
        let current = self.get_shipment(organization_id, shipment_id)?;

        let mut keys = vec![Self::key::<Shipment>(organization_id, shipment_id)];
        if new_status == ShipmentStatus::Cancelled {
            keys.extend(
                current
                    .line_items()
                    .iter()
                    .map(|l| Self::key::<InventoryItem>(organization_id, l.inventory_item_id)),
            );
        }
        let _guard = self.locks.acquire(keys);

        let (stored, event, old_status, restored) = self.with_retries("set_shipment_status", || {
            let shipment = self.get_shipment(organization_id, shipment_id)?;
            let (next, event) = shipment.set_status(new_status, notes.clone(), now)?;

            let cancelling = new_status == ShipmentStatus::Cancelled
                && shipment.status() != ShipmentStatus::Cancelled;
            let (requested, restored) = if cancelling {
                self.restore_reservation(&shipment, now)?
            } else {
                (BTreeMap::new(), Vec::new())
            };

            match self
                .stores
                .shipments
                .update(next, ExpectedVersion::Exact(shipment.version()))
            {
                Ok(stored) => Ok((stored, event, shipment.status(), restored)),
                Err(err) => {
                    self.reserve_unpublished(&restored, &requested, shipment_id, now);
                    Err(err.into())
                }
            }
        })?;

        self.publish(
            organization_id,
            shipment_id,
            Shipment::KIND,
            stored.version(),
            &event,
        )?;
        for (item, event) in &restored {
            self.publish_item(item, event)?;
        }
        info!(
            organization_id = %organization_id,
            shipment_id = %shipment_id,
            old_status = %old_status,
            new_status = %new_status,
            restored_items = restored.len(),
            "shipment status changed"
        );
        Ok(stored)
    }

    /// Write back every reserved quantity of `shipment` as one batch.
    ///
    /// Items deleted since the reservation are skipped. Nothing is published.
    fn restore_reservation(
        &self,
        shipment: &Shipment,
        now: DateTime<Utc>,
    ) -> Result<(BTreeMap<InventoryItemId, u64>, StockWrites), ServiceError> {
        let organization_id = shipment.organization_id();
        let shipment_id = shipment.id();
        let requested = requested_quantities(shipment.line_items())?;

        let mut batch = Vec::with_capacity(requested.len());
        let mut events = Vec::with_capacity(requested.len());
        for (item_id, quantity) in &requested {
            let Some(item) = self.stores.inventory.get(organization_id, *item_id)? else {
                warn!(shipment_id = %shipment_id, item_id = %item_id, "reserved item no longer exists");
                continue;
            };
            let (next, event) = item.adjust_quantity(
                signed(*quantity)?,
                UpdateCause::ReservationReleased { shipment_id },
                now,
            )?;
            batch.push((next, ExpectedVersion::Exact(item.version())));
            events.push(event);
        }
        if batch.is_empty() {
            return Ok((requested, Vec::new()));
        }
        let stored = self.stores.inventory.update_batch(batch)?;
        Ok((requested, stored.into_iter().zip(events).collect()))
    }

    pub fn get_shipment(
        &self,
        organization_id: OrganizationId,
        shipment_id: ShipmentId,
    ) -> Result<Shipment, ServiceError> {
        self.stores
            .shipments
            .get(organization_id, shipment_id)?
            .ok_or_else(|| not_found(Shipment::KIND, shipment_id))
    }

    pub fn find_shipment_by_tracking_number(
        &self,
        organization_id: OrganizationId,
        tracking_number: &str,
    ) -> Result<Shipment, ServiceError> {
        let wanted = tracking_number.trim();
        self.stores
            .shipments
            .find(organization_id, &|s| s.tracking_number().eq_ignore_ascii_case(wanted))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Store(StoreError::NotFound(format!("tracking number {wanted}"))))
    }

    /// Newest first.
    pub fn list_shipments(
        &self,
        organization_id: OrganizationId,
        filter: ShipmentFilter,
    ) -> Result<Vec<Shipment>, ServiceError> {
        let mut shipments = self
            .stores
            .shipments
            .find(organization_id, &|s| filter.matches(s))?;
        shipments.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(shipments)
    }

    pub fn shipment_statistics(
        &self,
        organization_id: OrganizationId,
    ) -> Result<ShipmentStatistics, ServiceError> {
        let shipments = self.stores.shipments.list(organization_id)?;
        Ok(ShipmentStatistics::compute(&shipments))
    }
}
