//! Request/response bodies that have no domain type of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relieftrack_auth::Role;
use relieftrack_core::{OrganizationId, UserId, WarehouseId};
use relieftrack_infra::{PartnerFilter, TransportFilter};
use relieftrack_inventory::ItemDetails;
use relieftrack_partners::{AccountStatus, Availability, PartnershipType, TransportType};
use relieftrack_shipments::ShipmentStatus;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: UserId,
    pub email: String,
    pub roles: Vec<Role>,
    pub organization_id: OrganizationId,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub warehouse_id: WarehouseId,
    #[serde(flatten)]
    pub details: ItemDetails,
    #[serde(default)]
    pub quantity: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuarantineRequest {
    pub quarantined: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UtilizationRequest {
    pub utilization: u8,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub availability: Availability,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: u8,
}

/// `?required=` square meters for a warehouse capacity check.
#[derive(Debug, Deserialize)]
pub struct CapacityQuery {
    pub required: u64,
}

/// `?q=&type=&availability=` on transport search.
#[derive(Debug, Default, Deserialize)]
pub struct TransportSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub transport_type: Option<TransportType>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

impl TransportSearchQuery {
    pub fn filter(&self) -> TransportFilter {
        TransportFilter {
            transport_type: self.transport_type,
            availability: self.availability,
        }
    }
}

/// `?q=&type=&status=` on partner search.
#[derive(Debug, Default, Deserialize)]
pub struct PartnerSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub partnership_type: Option<PartnershipType>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl PartnerSearchQuery {
    pub fn filter(&self) -> PartnerFilter {
        PartnerFilter {
            partnership_type: self.partnership_type,
            status: self.status,
        }
    }
}

/// Optional `?expected_version=` guard on replace/delete.
#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    #[serde(default)]
    pub expected_version: Option<u64>,
}
