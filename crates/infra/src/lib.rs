//! Infrastructure layer: record storage, locking, configuration and the
//! logistics service that ties domain rules to storage and the change bus.

pub mod config;
pub mod locks;
pub mod record_store;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use record_store::{InMemoryRecordStore, RecordStore, StoreError};
pub use service::{
    CapacityCheck, DashboardSummary, ItemFilter, LogisticsService, NewShipment, PartnerFilter,
    ServiceError, ServiceSettings, ShipmentFilter, Stores, TransportFilter,
};
