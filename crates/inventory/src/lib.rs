//! Inventory domain module.
//!
//! This crate contains the business rules for relief stock, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage): the stock-status
//! engine, quantity adjustments and the statistics pass.

pub mod item;
pub mod statistics;
pub mod status;

pub use item::{
    BinLocation, Category, CreateItem, InventoryEvent, InventoryItem, InventoryUpdated,
    ItemCreated, ItemDetails, ItemDetailsPatch, ItemRemoved, Unit, UpdateCause,
};
pub use statistics::{CategoryTotals, InventoryStatistics};
pub use status::{StockStatus, derive_status, item_status};
