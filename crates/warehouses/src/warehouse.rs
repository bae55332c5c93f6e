use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_core::contact::{normalize_email, normalize_phone, optional_text, required_text};
use relieftrack_core::{DomainError, OrganizationId, Record, WarehouseId};

const NOTES_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseStatus {
    #[default]
    Operational,
    Maintenance,
    Full,
}

/// Capacity band derived from utilization: ≥95 Critical, ≥80 High, ≥50 Medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityStatus {
    Low,
    Medium,
    High,
    Critical,
}

impl CapacityStatus {
    pub fn from_utilization(utilization: u8) -> Self {
        match utilization {
            95..=u8::MAX => CapacityStatus::Critical,
            80..=94 => CapacityStatus::High,
            50..=79 => CapacityStatus::Medium,
            _ => CapacityStatus::Low,
        }
    }
}

/// Editable warehouse fields (create and full replace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseFields {
    pub location: String,
    /// Floor space in square meters.
    pub capacity: u64,
    /// Name of the transport provider serving this site.
    pub transport: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: WarehouseStatus,
    /// Percentage of capacity in use.
    #[serde(default)]
    pub utilization: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WarehouseFields {
    pub fn validated(self) -> Result<Self, DomainError> {
        if self.capacity < 1 {
            return Err(DomainError::validation("capacity must be at least 1"));
        }
        if self.utilization > 100 {
            return Err(DomainError::validation("utilization must be between 0 and 100"));
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(DomainError::validation("latitude must be between -90 and 90"));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(DomainError::validation(
                        "longitude must be between -180 and 180",
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(DomainError::validation(
                    "latitude and longitude must be provided together",
                ));
            }
        }

        Ok(Self {
            location: required_text("location", &self.location, None)?,
            transport: required_text("transport", &self.transport, None)?,
            email: normalize_email(&self.email)?,
            phone: normalize_phone(&self.phone)?,
            notes: optional_text("notes", self.notes, NOTES_MAX)?,
            ..self
        })
    }
}

/// Record: Warehouse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warehouse {
    id: WarehouseId,
    organization_id: OrganizationId,
    #[serde(flatten)]
    fields: WarehouseFields,
    capacity_status: CapacityStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Record for Warehouse {
    type Id = WarehouseId;

    const KIND: &'static str = "warehouse";

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

impl Warehouse {
    pub fn create(
        organization_id: OrganizationId,
        id: WarehouseId,
        fields: WarehouseFields,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let fields = fields.validated()?;
        Ok(Self {
            id,
            organization_id,
            capacity_status: CapacityStatus::from_utilization(fields.utilization),
            fields,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Replace every editable field, keeping identity and creation time.
    pub fn replace(&self, fields: WarehouseFields, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let fields = fields.validated()?;
        let mut next = self.clone();
        next.capacity_status = CapacityStatus::from_utilization(fields.utilization);
        next.fields = fields;
        next.updated_at = now;
        Ok(next)
    }

    pub fn fields(&self) -> &WarehouseFields {
        &self.fields
    }

    pub fn location(&self) -> &str {
        &self.fields.location
    }

    pub fn status(&self) -> WarehouseStatus {
        self.fields.status
    }

    pub fn capacity(&self) -> u64 {
        self.fields.capacity
    }

    pub fn utilization(&self) -> u8 {
        self.fields.utilization
    }

    pub fn capacity_status(&self) -> CapacityStatus {
        self.capacity_status
    }

    /// `(latitude, longitude)` when the site has been placed on the map.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.fields.latitude.zip(self.fields.longitude)
    }

    /// Whether the free share of capacity covers `required` square meters.
    pub fn can_accept_items(&self, required: u64) -> bool {
        let free_percent = u128::from(100 - self.fields.utilization.min(100));
        u128::from(self.fields.capacity) * free_percent >= u128::from(required) * 100
    }
}

/// Capacity and status totals over a set of warehouses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WarehouseStatistics {
    pub total_warehouses: u64,
    pub total_capacity: u64,
    pub avg_utilization: f64,
    pub operational_count: u64,
    pub maintenance_count: u64,
    pub full_count: u64,
}

impl WarehouseStatistics {
    pub fn compute<'a>(warehouses: impl IntoIterator<Item = &'a Warehouse>) -> Self {
        let mut stats = Self::default();
        let mut utilization_sum = 0u64;

        for w in warehouses {
            stats.total_warehouses += 1;
            stats.total_capacity = stats.total_capacity.saturating_add(w.capacity());
            utilization_sum += u64::from(w.utilization());
            match w.status() {
                WarehouseStatus::Operational => stats.operational_count += 1,
                WarehouseStatus::Maintenance => stats.maintenance_count += 1,
                WarehouseStatus::Full => stats.full_count += 1,
            }
        }

        if stats.total_warehouses > 0 {
            stats.avg_utilization = utilization_sum as f64 / stats.total_warehouses as f64;
        }
        stats
    }
}
