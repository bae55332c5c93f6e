//! Shipments domain module.
//!
//! Shipment records, line-item validation and the status state machine.
//! Inventory reservation is coordinated by the infrastructure layer; this
//! crate only decides what a shipment looks like and which transitions are
//! legal.

pub mod shipment;
pub mod statistics;

pub use shipment::{
    CreateShipment, GeoPoint, LineItem, Priority, Shipment, ShipmentCreated, ShipmentEvent,
    ShipmentStatus, StatusChanged, requested_quantities, tracking_number,
};
pub use statistics::ShipmentStatistics;
