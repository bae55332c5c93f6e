use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;

use relieftrack_core::{
    DomainError, ExpectedVersion, InventoryItemId, OrganizationId, Record, WarehouseId,
};
use relieftrack_events::{EventBus, EventEnvelope};
use relieftrack_inventory::{
    Category, CreateItem, InventoryEvent, InventoryItem, InventoryStatistics, ItemDetails,
    ItemDetailsPatch, StockStatus, UpdateCause,
};
use relieftrack_warehouses::Warehouse;

use super::{LogisticsService, ServiceError, not_found};

/// Optional narrowing for [`LogisticsService::list_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ItemFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub category: Option<Category>,
    pub status: Option<StockStatus>,
}

impl ItemFilter {
    fn matches(&self, item: &InventoryItem) -> bool {
        self.warehouse_id.is_none_or(|w| item.warehouse_id() == w)
            && self.category.is_none_or(|c| item.category() == c)
            && self.status.is_none_or(|s| item.status() == s)
    }
}

impl<B> LogisticsService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_item(
        &self,
        organization_id: OrganizationId,
        warehouse_id: WarehouseId,
        details: ItemDetails,
        quantity: u64,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ServiceError> {
        let _guard = self
            .locks
            .acquire_one(Self::key::<Warehouse>(organization_id, warehouse_id));

        let item = self.with_retries("create_item", || {
            if self.stores.warehouses.get(organization_id, warehouse_id)?.is_none() {
                return Err(DomainError::item_not_found(format!("warehouse {warehouse_id}")).into());
            }
            let (item, event) = InventoryItem::create(CreateItem {
                organization_id,
                item_id: InventoryItemId::new(),
                warehouse_id,
                details: details.clone(),
                quantity,
                occurred_at: now,
            })?;
            Ok((self.stores.inventory.insert(item)?, event))
        });
        let (item, event) = item?;

        self.publish_item(&item, &event)?;
        info!(
            organization_id = %organization_id,
            item_id = %item.id(),
            warehouse_id = %warehouse_id,
            quantity,
            status = %item.status(),
            "inventory item created"
        );
        Ok(item)
    }

    pub fn get_item(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
    ) -> Result<InventoryItem, ServiceError> {
        self.stores
            .inventory
            .get(organization_id, item_id)?
            .ok_or_else(|| not_found(InventoryItem::KIND, item_id))
    }

    pub fn list_items(
        &self,
        organization_id: OrganizationId,
        filter: ItemFilter,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        Ok(self
            .stores
            .inventory
            .find(organization_id, &|item| filter.matches(item))?)
    }

    /// Apply a signed stock correction.
    pub fn adjust_quantity(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ServiceError> {
        let item = self.mutate_item(organization_id, item_id, "adjust_quantity", |item| {
            item.adjust_quantity(delta, UpdateCause::Adjustment, now)
        })?;
        info!(
            organization_id = %organization_id,
            item_id = %item_id,
            delta,
            quantity = item.quantity(),
            status = %item.status(),
            "inventory adjusted"
        );
        Ok(item)
    }

    pub fn update_item(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
        patch: ItemDetailsPatch,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ServiceError> {
        let item = self.mutate_item(organization_id, item_id, "update_item", |item| {
            item.update_details(patch.clone(), now)
        })?;
        info!(organization_id = %organization_id, item_id = %item_id, status = %item.status(), "inventory details updated");
        Ok(item)
    }

    pub fn set_quarantine(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
        quarantined: bool,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem, ServiceError> {
        let item = self.mutate_item(organization_id, item_id, "set_quarantine", |item| {
            Ok(item.set_quarantine(quarantined, now))
        })?;
        info!(organization_id = %organization_id, item_id = %item_id, quarantined, "inventory quarantine changed");
        Ok(item)
    }

    /// Recompute time-dependent statuses; writes and publishes only changes.
    pub fn refresh_statuses(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let mut changed = Vec::new();
        for item in self.stores.inventory.list(organization_id)? {
            let item_id = item.id();
            let _guard = self
                .locks
                .acquire_one(Self::key::<InventoryItem>(organization_id, item_id));

            let written = self.with_retries("refresh_statuses", || {
                let Some(current) = self.stores.inventory.get(organization_id, item_id)? else {
                    return Ok(None);
                };
                let Some((next, event)) = current.refresh_status(now) else {
                    return Ok(None);
                };
                let stored = self
                    .stores
                    .inventory
                    .update(next, ExpectedVersion::Exact(current.version()))?;
                Ok(Some((stored, event)))
            })?;

            if let Some((stored, event)) = written {
                self.publish_item(&stored, &event)?;
                changed.push(stored);
            }
        }

        info!(organization_id = %organization_id, changed = changed.len(), "inventory statuses refreshed");
        Ok(changed)
    }

    /// Delete an item no open shipment references.
    pub fn remove_item(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let _guard = self
            .locks
            .acquire_one(Self::key::<InventoryItem>(organization_id, item_id));

        let (removed, event) = self.with_retries("remove_item", || {
            let item = self.get_item(organization_id, item_id)?;
            let open = self
                .stores
                .shipments
                .find(organization_id, &|s| s.is_open() && s.references_item(item_id))?;
            if let Some(shipment) = open.first() {
                return Err(DomainError::in_use(format!(
                    "inventory item {item_id} is referenced by open shipment {}",
                    shipment.tracking_number()
                ))
                .into());
            }
            let removed = self.stores.inventory.delete(
                organization_id,
                item_id,
                ExpectedVersion::Exact(item.version()),
            )?;
            let event = removed.remove(now);
            Ok((removed, event))
        })?;

        self.publish(
            organization_id,
            item_id,
            InventoryItem::KIND,
            removed.version() + 1,
            &event,
        )?;
        info!(organization_id = %organization_id, item_id = %item_id, "inventory item removed");
        Ok(())
    }

    pub fn inventory_statistics(
        &self,
        organization_id: OrganizationId,
    ) -> Result<InventoryStatistics, ServiceError> {
        let items = self.stores.inventory.list(organization_id)?;
        Ok(InventoryStatistics::compute(&items))
    }

    /// Lock, load, apply `op`, write with an exact version, then publish.
    fn mutate_item(
        &self,
        organization_id: OrganizationId,
        item_id: InventoryItemId,
        operation: &'static str,
        op: impl Fn(&InventoryItem) -> Result<(InventoryItem, InventoryEvent), DomainError>,
    ) -> Result<InventoryItem, ServiceError> {
        let _guard = self
            .locks
            .acquire_one(Self::key::<InventoryItem>(organization_id, item_id));

        let (stored, event) = self.with_retries(operation, || {
            let item = self.get_item(organization_id, item_id)?;
            let (next, event) = op(&item)?;
            let stored = self
                .stores
                .inventory
                .update(next, ExpectedVersion::Exact(item.version()))?;
            Ok((stored, event))
        })?;

        self.publish_item(&stored, &event)?;
        Ok(stored)
    }

    pub(super) fn publish_item(
        &self,
        item: &InventoryItem,
        event: &InventoryEvent,
    ) -> Result<(), ServiceError> {
        self.publish(
            item.organization_id(),
            item.id(),
            InventoryItem::KIND,
            item.version(),
            event,
        )
    }
}
