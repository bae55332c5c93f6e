//! Organization-scoped record storage boundary.
//!
//! The record store is the source of truth for current state. It makes no
//! storage assumptions beyond versioned, atomic writes.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use r#trait::{RecordStore, StoreError};
