//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures such as validation,
/// stock sufficiency and lifecycle rules. Storage and transport
/// failures belong to the infrastructure layer.
///
/// Every variant describes a request that was rejected before anything was
/// written, so callers never need to compensate for a domain error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, out-of-range number).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced inventory item or warehouse does not exist.
    #[error("referenced item not found: {0}")]
    ItemNotFound(String),

    /// The requested quantity exceeds what is available.
    #[error("insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: u64,
        requested: u64,
    },

    /// The item exists but may not be reserved (e.g. quarantined).
    #[error("item unavailable: {0}")]
    ItemUnavailable(String),

    /// A shipment request carried no line items.
    #[error("shipment must contain at least one line item")]
    EmptyLineItems,

    /// A status change was attempted from a terminal state.
    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// The record is still referenced and cannot be removed.
    #[error("record in use: {0}")]
    InUse(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn item_not_found(id: impl core::fmt::Display) -> Self {
        Self::ItemNotFound(id.to_string())
    }

    pub fn insufficient_stock(
        item_id: impl core::fmt::Display,
        available: u64,
        requested: u64,
    ) -> Self {
        Self::InsufficientStock {
            item_id: item_id.to_string(),
            available,
            requested,
        }
    }

    pub fn invalid_transition(from: impl core::fmt::Display, to: impl core::fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn in_use(msg: impl Into<String>) -> Self {
        Self::InUse(msg.into())
    }
}
