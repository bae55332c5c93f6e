//! Warehouses domain module.
//!
//! Warehouse records, their validation rules and the capacity helpers used by
//! the dashboard.

pub mod warehouse;

pub use warehouse::{
    CapacityStatus, Warehouse, WarehouseFields, WarehouseStatistics, WarehouseStatus,
};
