use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_core::{
    DomainError, InventoryItemId, OrganizationId, Record, ShipmentId, UserId, WarehouseId,
};
use relieftrack_events::Event;

const NOTE_MAX: usize = 500;

/// Shipment status lifecycle.
///
/// `Delivered` and `Cancelled` are terminal. Every other state may move to
/// any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Delayed,
    Cancelled,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 5] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::Delivered,
        ShipmentStatus::Delayed,
        ShipmentStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in-transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Delayed => "delayed",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Map position of a shipment in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DomainError::validation("latitude must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::validation("longitude must be between -180 and 180"));
        }
        Ok(())
    }
}

/// Shipment line: inventory item and requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub inventory_item_id: InventoryItemId,
    pub quantity: u64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validate line items and sum the requested quantity per inventory item.
///
/// The map is ordered by item id, which is also the order in which the
/// reservation path locks items.
pub fn requested_quantities(
    line_items: &[LineItem],
) -> Result<BTreeMap<InventoryItemId, u64>, DomainError> {
    if line_items.is_empty() {
        return Err(DomainError::EmptyLineItems);
    }

    let mut totals = BTreeMap::new();
    for (idx, line) in line_items.iter().enumerate() {
        if line.quantity == 0 {
            return Err(DomainError::validation(format!(
                "line item {} quantity must be at least 1",
                idx + 1
            )));
        }
        let total: &mut u64 = totals.entry(line.inventory_item_id).or_default();
        *total = total
            .checked_add(line.quantity)
            .ok_or_else(|| DomainError::validation("line item quantity overflow"))?;
    }
    Ok(totals)
}

/// Human-facing tracking number: `SHP-<yyyymmdd>-<8 hex>`.
///
/// The hex suffix is taken from the random tail of the shipment id, so two
/// shipments created on the same day still get distinct numbers.
pub fn tracking_number(shipment_id: ShipmentId, created_at: DateTime<Utc>) -> String {
    let simple = shipment_id.as_uuid().simple().to_string();
    let suffix = &simple[simple.len() - 8..];
    format!(
        "SHP-{}-{}",
        created_at.format("%Y%m%d"),
        suffix.to_ascii_uppercase()
    )
}

fn validate_note(note: &str) -> Result<(), DomainError> {
    if note.chars().count() > NOTE_MAX {
        return Err(DomainError::validation(format!(
            "notes cannot exceed {NOTE_MAX} characters"
        )));
    }
    Ok(())
}

/// Record: Shipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shipment {
    id: ShipmentId,
    organization_id: OrganizationId,
    tracking_number: String,
    source_warehouse_id: WarehouseId,
    destination: String,
    line_items: Vec<LineItem>,
    status: ShipmentStatus,
    priority: Priority,
    coordinates: Option<GeoPoint>,
    estimated_delivery: Option<DateTime<Utc>>,
    actual_delivery: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Command: CreateShipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShipment {
    pub organization_id: OrganizationId,
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub source_warehouse_id: WarehouseId,
    pub destination: String,
    pub line_items: Vec<LineItem>,
    pub priority: Priority,
    pub coordinates: Option<GeoPoint>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ShipmentCreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCreated {
    pub organization_id: OrganizationId,
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub source_warehouse_id: WarehouseId,
    pub destination: String,
    pub line_items: Vec<LineItem>,
    pub priority: Priority,
    pub coordinates: Option<GeoPoint>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged (`shipment.statusChanged`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub organization_id: OrganizationId,
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub old_status: ShipmentStatus,
    pub new_status: ShipmentStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Serialized untagged: the envelope carries the event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShipmentEvent {
    ShipmentCreated(ShipmentCreated),
    StatusChanged(StatusChanged),
}

impl Event for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated(_) => "shipment.created",
            ShipmentEvent::StatusChanged(_) => "shipment.statusChanged",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShipmentEvent::ShipmentCreated(e) => e.occurred_at,
            ShipmentEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Record for Shipment {
    type Id = ShipmentId;

    const KIND: &'static str = "shipment";

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

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("tracking_number", self.tracking_number.clone())]
    }
}

impl Shipment {
    /// Validate the request and build a `pending` shipment.
    ///
    /// Stock checks are not made here: the caller reserves inventory for
    /// [`requested_quantities`] before storing the result.
    pub fn create(cmd: CreateShipment) -> Result<(Self, ShipmentEvent), DomainError> {
        requested_quantities(&cmd.line_items)?;

        let destination = cmd.destination.trim().to_string();
        if destination.is_empty() {
            return Err(DomainError::validation("destination is required"));
        }
        if cmd.tracking_number.trim().is_empty() {
            return Err(DomainError::validation("tracking number is required"));
        }
        if let Some(point) = &cmd.coordinates {
            point.validate()?;
        }
        let notes = cmd.notes.filter(|n| !n.trim().is_empty());
        if let Some(n) = &notes {
            validate_note(n)?;
        }

        let shipment = Self {
            id: cmd.shipment_id,
            organization_id: cmd.organization_id,
            tracking_number: cmd.tracking_number,
            source_warehouse_id: cmd.source_warehouse_id,
            destination,
            line_items: cmd.line_items,
            status: ShipmentStatus::Pending,
            priority: cmd.priority,
            coordinates: cmd.coordinates,
            estimated_delivery: cmd.estimated_delivery,
            actual_delivery: None,
            notes,
            created_by: cmd.created_by,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
            version: 0,
        };

        let event = ShipmentEvent::ShipmentCreated(ShipmentCreated {
            organization_id: shipment.organization_id,
            shipment_id: shipment.id,
            tracking_number: shipment.tracking_number.clone(),
            source_warehouse_id: shipment.source_warehouse_id,
            destination: shipment.destination.clone(),
            line_items: shipment.line_items.clone(),
            priority: shipment.priority,
            coordinates: shipment.coordinates,
            occurred_at: cmd.occurred_at,
        });

        Ok((shipment, event))
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn source_warehouse_id(&self) -> WarehouseId {
        self.source_warehouse_id
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.coordinates
    }

    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Non-terminal shipments still hold reserved stock.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn references_item(&self, item_id: InventoryItemId) -> bool {
        self.line_items.iter().any(|l| l.inventory_item_id == item_id)
    }

    /// Whole days between creation and delivery; `None` until delivered.
    pub fn duration_days(&self) -> Option<i64> {
        self.actual_delivery
            .map(|delivered| (delivered - self.created_at).num_days())
    }

    /// Move to `new_status`, appending `notes` to the running log.
    ///
    /// Fails with `InvalidTransition` from a terminal state, including a
    /// request for the current terminal state. A request for the current
    /// non-terminal state only appends the note and still yields the event
    /// (`old == new`).
    pub fn set_status(
        &self,
        new_status: ShipmentStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Self, ShipmentEvent), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(self.status, new_status));
        }
        let notes = notes.filter(|n| !n.trim().is_empty());
        if let Some(n) = &notes {
            validate_note(n)?;
        }

        let mut next = self.clone();
        if new_status != self.status {
            next.status = new_status;
            if new_status == ShipmentStatus::Delivered {
                next.actual_delivery = Some(now);
            }
            next.updated_at = now;
        }
        if let Some(n) = &notes {
            next.notes = Some(match &self.notes {
                Some(existing) => format!("{existing}\n{n}"),
                None => n.clone(),
            });
            next.updated_at = now;
        }

        let event = ShipmentEvent::StatusChanged(StatusChanged {
            organization_id: self.organization_id,
            shipment_id: self.id,
            tracking_number: self.tracking_number.clone(),
            old_status: self.status,
            new_status,
            notes,
            occurred_at: now,
        });

        Ok((next, event))
    }
}
