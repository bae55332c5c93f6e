use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_core::{
    DomainError, InventoryItemId, OrganizationId, Record, ShipmentId, WarehouseId,
};
use relieftrack_events::Event;

use crate::status::{StockStatus, item_status};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

/// Relief supply category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Water,
    Medical,
    Sanitary,
    Clothing,
    Bedding,
    Shelter,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Water,
        Category::Medical,
        Category::Sanitary,
        Category::Clothing,
        Category::Bedding,
        Category::Shelter,
        Category::Other,
    ];
}

/// Unit of measure for a stock line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Liters,
    #[default]
    Pieces,
    Boxes,
    Pallets,
    Units,
}

/// Physical position inside a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinLocation {
    pub aisle: Option<String>,
    pub shelf: Option<String>,
    pub bin: Option<String>,
}

/// Descriptive fields of an item (everything except stock and status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub unit: Unit,
    /// Cost per unit in the smallest currency unit (e.g., cents).
    #[serde(default)]
    pub unit_cost: u64,
    #[serde(default)]
    pub min_stock_level: u64,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub location: BinLocation,
}

impl ItemDetails {
    /// Validate and normalize (trim) descriptive fields.
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.name.chars().count() > NAME_MAX {
            return Err(DomainError::validation(format!(
                "name cannot exceed {NAME_MAX} characters"
            )));
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > DESCRIPTION_MAX {
                return Err(DomainError::validation(format!(
                    "description cannot exceed {DESCRIPTION_MAX} characters"
                )));
            }
        }
        Ok(self)
    }
}

/// Partial update of [`ItemDetails`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailsPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub unit_cost: Option<u64>,
    #[serde(default)]
    pub min_stock_level: Option<u64>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Remove the expiry date entirely (takes precedence over `expiry_date`).
    #[serde(default)]
    pub clear_expiry_date: bool,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub location: Option<BinLocation>,
}

impl ItemDetailsPatch {
    fn apply_to(self, mut details: ItemDetails) -> ItemDetails {
        if let Some(v) = self.name {
            details.name = v;
        }
        if let Some(v) = self.description {
            details.description = Some(v);
        }
        if let Some(v) = self.category {
            details.category = v;
        }
        if let Some(v) = self.unit {
            details.unit = v;
        }
        if let Some(v) = self.unit_cost {
            details.unit_cost = v;
        }
        if let Some(v) = self.min_stock_level {
            details.min_stock_level = v;
        }
        if self.clear_expiry_date {
            details.expiry_date = None;
        } else if let Some(v) = self.expiry_date {
            details.expiry_date = Some(v);
        }
        if let Some(v) = self.batch_number {
            details.batch_number = Some(v);
        }
        if let Some(v) = self.location {
            details.location = v;
        }
        details
    }
}

/// Record: InventoryItem.
///
/// Quantity and status only change through the operations below, each of which
/// recomputes the derived status and returns the resulting record together
/// with the event describing the change. Nothing here performs IO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    organization_id: OrganizationId,
    warehouse_id: WarehouseId,
    #[serde(flatten)]
    details: ItemDetails,
    quantity: u64,
    quarantined: bool,
    status: StockStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub organization_id: OrganizationId,
    pub item_id: InventoryItemId,
    pub warehouse_id: WarehouseId,
    pub details: ItemDetails,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Why an item changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UpdateCause {
    /// Manual stock correction (receipt, loss, count).
    Adjustment,
    /// Stock reserved for a new shipment.
    Reservation { shipment_id: ShipmentId },
    /// Reserved stock returned by a cancelled shipment.
    ReservationReleased { shipment_id: ShipmentId },
    /// Descriptive fields or threshold changed.
    DetailsChanged,
    /// Quarantine flag toggled.
    Quarantine,
    /// Periodic recomputation (expiry passed).
    StatusRefresh,
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub organization_id: OrganizationId,
    pub item_id: InventoryItemId,
    pub warehouse_id: WarehouseId,
    pub name: String,
    pub quantity: u64,
    pub status: StockStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InventoryUpdated (`inventory.updated`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUpdated {
    pub organization_id: OrganizationId,
    pub item_id: InventoryItemId,
    pub old_quantity: u64,
    pub new_quantity: u64,
    pub old_status: StockStatus,
    pub new_status: StockStatus,
    pub cause: UpdateCause,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub organization_id: OrganizationId,
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Serialized untagged: the envelope carries the event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    InventoryUpdated(InventoryUpdated),
    ItemRemoved(ItemRemoved),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.created",
            InventoryEvent::InventoryUpdated(_) => "inventory.updated",
            InventoryEvent::ItemRemoved(_) => "inventory.removed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::InventoryUpdated(e) => e.occurred_at,
            InventoryEvent::ItemRemoved(e) => e.occurred_at,
        }
    }
}

impl Record for InventoryItem {
    type Id = InventoryItemId;

    const KIND: &'static str = "inventory.item";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl InventoryItem {
    /// Validate a creation command and build the initial record.
    pub fn create(cmd: CreateItem) -> Result<(Self, InventoryEvent), DomainError> {
        let details = cmd.details.validated()?;
        let status = item_status(
            cmd.quantity,
            details.min_stock_level,
            details.expiry_date,
            false,
            cmd.occurred_at,
        );

        let item = Self {
            id: cmd.item_id,
            organization_id: cmd.organization_id,
            warehouse_id: cmd.warehouse_id,
            details,
            quantity: cmd.quantity,
            quarantined: false,
            status,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
            version: 0,
        };

        let event = InventoryEvent::ItemCreated(ItemCreated {
            organization_id: item.organization_id,
            item_id: item.id,
            warehouse_id: item.warehouse_id,
            name: item.details.name.clone(),
            quantity: item.quantity,
            status,
            occurred_at: cmd.occurred_at,
        });

        Ok((item, event))
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn details(&self) -> &ItemDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn category(&self) -> Category {
        self.details.category
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn min_stock_level(&self) -> u64 {
        self.details.min_stock_level
    }

    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stock value in the smallest currency unit.
    pub fn total_value(&self) -> u128 {
        u128::from(self.quantity) * u128::from(self.details.unit_cost)
    }

    /// Check that `requested` units may be reserved from this item.
    pub fn ensure_reservable(&self, requested: u64) -> Result<(), DomainError> {
        if self.quarantined {
            return Err(DomainError::ItemUnavailable(format!(
                "inventory item {} is quarantined",
                self.id
            )));
        }
        if requested > self.quantity {
            return Err(DomainError::insufficient_stock(self.id, self.quantity, requested));
        }
        Ok(())
    }

    /// Apply a signed quantity delta, recomputing the status.
    ///
    /// Fails with `InsufficientStock` when the result would be negative.
    pub fn adjust_quantity(
        &self,
        delta: i64,
        cause: UpdateCause,
        now: DateTime<Utc>,
    ) -> Result<(Self, InventoryEvent), DomainError> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_quantity = if delta < 0 {
            let requested = delta.unsigned_abs();
            self.quantity
                .checked_sub(requested)
                .ok_or_else(|| DomainError::insufficient_stock(self.id, self.quantity, requested))?
        } else {
            self.quantity
                .checked_add(delta.unsigned_abs())
                .ok_or_else(|| DomainError::validation("quantity overflow"))?
        };

        let mut next = self.clone();
        next.quantity = new_quantity;
        Ok(self.finish_update(next, cause, now))
    }

    /// Change descriptive fields and/or the threshold.
    pub fn update_details(
        &self,
        patch: ItemDetailsPatch,
        now: DateTime<Utc>,
    ) -> Result<(Self, InventoryEvent), DomainError> {
        let details = patch.apply_to(self.details.clone()).validated()?;
        let mut next = self.clone();
        next.details = details;
        Ok(self.finish_update(next, UpdateCause::DetailsChanged, now))
    }

    /// Put the item into (or release it from) quarantine.
    pub fn set_quarantine(&self, quarantined: bool, now: DateTime<Utc>) -> (Self, InventoryEvent) {
        let mut next = self.clone();
        next.quarantined = quarantined;
        self.finish_update(next, UpdateCause::Quarantine, now)
    }

    /// Recompute the time-dependent status; `None` when nothing changed.
    pub fn refresh_status(&self, now: DateTime<Utc>) -> Option<(Self, InventoryEvent)> {
        let status = self.compute_status(now);
        if status == self.status {
            return None;
        }
        Some(self.finish_update(self.clone(), UpdateCause::StatusRefresh, now))
    }

    /// Build the removal event. Reference checks are the caller's job.
    pub fn remove(&self, now: DateTime<Utc>) -> InventoryEvent {
        InventoryEvent::ItemRemoved(ItemRemoved {
            organization_id: self.organization_id,
            item_id: self.id,
            occurred_at: now,
        })
    }

    fn compute_status(&self, now: DateTime<Utc>) -> StockStatus {
        item_status(
            self.quantity,
            self.details.min_stock_level,
            self.details.expiry_date,
            self.quarantined,
            now,
        )
    }

    fn finish_update(&self, mut next: Self, cause: UpdateCause, now: DateTime<Utc>) -> (Self, InventoryEvent) {
        next.status = next.compute_status(now);
        next.updated_at = now;

        let event = InventoryEvent::InventoryUpdated(InventoryUpdated {
            organization_id: self.organization_id,
            item_id: self.id,
            old_quantity: self.quantity,
            new_quantity: next.quantity,
            old_status: self.status,
            new_status: next.status,
            cause,
            occurred_at: now,
        });

        (next, event)
    }
}
