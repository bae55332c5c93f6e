use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_core::contact::{
    check_rating, normalize_email, normalize_phone, optional_text, required_text,
};
use relieftrack_core::{DomainError, OrganizationId, Record, TransportId};

use crate::partner::AccountStatus;

const NAME_MAX: usize = 100;
const NOTES_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportType {
    #[serde(rename = "Road Trucking")]
    RoadTrucking,
    #[serde(rename = "Air Cargo")]
    AirCargo,
    Maritime,
    Rail,
    Motorcycle,
    #[serde(rename = "Multiple Modes")]
    MultipleModes,
}

impl TransportType {
    pub const ALL: [TransportType; 6] = [
        TransportType::RoadTrucking,
        TransportType::AirCargo,
        TransportType::Maritime,
        TransportType::Rail,
        TransportType::Motorcycle,
        TransportType::MultipleModes,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    Limited,
    Unavailable,
    Seasonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Truck,
    Van,
    Motorcycle,
    Aircraft,
    Ship,
    Train,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Operational,
    Maintenance,
    OutOfService,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub capacity: u64,
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub status: VehicleStatus,
}

fn default_rating() -> u8 {
    3
}

/// Editable transport provider fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFields {
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub transport_type: TransportType,
    #[serde(default)]
    pub capacity: u64,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default = "default_rating")]
    pub rating: u8,
    #[serde(default)]
    pub service_areas: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
}

impl TransportFields {
    pub fn validated(self) -> Result<Self, DomainError> {
        check_rating(self.rating)?;
        let service_areas = self
            .service_areas
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(Self {
            name: required_text("name", &self.name, Some(NAME_MAX))?,
            location: required_text("location", &self.location, None)?,
            email: normalize_email(&self.email)?,
            phone: normalize_phone(&self.phone)?,
            notes: optional_text("notes", self.notes, NOTES_MAX)?,
            service_areas,
            ..self
        })
    }
}

/// Record: TransportProvider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportProvider {
    id: TransportId,
    organization_id: OrganizationId,
    #[serde(flatten)]
    fields: TransportFields,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Record for TransportProvider {
    type Id = TransportId;

    const KIND: &'static str = "transport";

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

impl TransportProvider {
    pub fn create(
        organization_id: OrganizationId,
        id: TransportId,
        fields: TransportFields,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id,
            fields: fields.validated()?,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn replace(&self, fields: TransportFields, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut next = self.clone();
        next.fields = fields.validated()?;
        next.updated_at = now;
        Ok(next)
    }

    pub fn fields(&self) -> &TransportFields {
        &self.fields
    }

    pub fn transport_type(&self) -> TransportType {
        self.fields.transport_type
    }

    pub fn status(&self) -> AccountStatus {
        self.fields.status
    }

    pub fn availability(&self) -> Availability {
        self.fields.availability
    }

    pub fn rating(&self) -> u8 {
        self.fields.rating
    }

    pub fn capacity(&self) -> u64 {
        self.fields.capacity
    }

    /// Base capacity plus the capacity of every listed vehicle.
    pub fn total_capacity(&self) -> u64 {
        self.fields
            .vehicles
            .iter()
            .fold(self.fields.capacity, |acc, v| acc.saturating_add(v.capacity))
    }

    pub fn operational_vehicles(&self) -> usize {
        self.fields
            .vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Operational)
            .count()
    }

    pub fn serves_area(&self, area: &str) -> bool {
        self.fields.service_areas.iter().any(|a| a == area)
    }

    /// Active and at least partially available.
    pub fn is_bookable(&self) -> bool {
        self.fields.status == AccountStatus::Active
            && matches!(
                self.fields.availability,
                Availability::Available | Availability::Limited
            )
    }
}
