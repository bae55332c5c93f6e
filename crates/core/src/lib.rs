//! `relieftrack-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model and the record contract every stored
//! entity implements.

pub mod contact;
pub mod error;
pub mod id;
pub mod record;

pub use error::DomainError;
pub use id::{
    InventoryItemId, OrganizationId, PartnerId, ShipmentId, TransportId, UserId, WarehouseId,
};
pub use record::{ExpectedVersion, Record};
