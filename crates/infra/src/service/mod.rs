//! Logistics service: the only writer of records.
//!
//! Every mutating operation follows the same pipeline:
//!
//! 1. take the in-process locks of every entity it touches
//! 2. load current state from the record store
//! 3. run the pure domain operation (validation + next state + event)
//! 4. write with an exact expected version (retried on conflict)
//! 5. publish the events, in write order, only after the write succeeded
//!
//! A rejected operation writes nothing and publishes nothing.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use relieftrack_core::{DomainError, OrganizationId, Record};
use relieftrack_events::{Event, EventBus, EventEnvelope};
use relieftrack_inventory::InventoryItem;
use relieftrack_partners::{Partner, TransportProvider};
use relieftrack_shipments::Shipment;
use relieftrack_warehouses::Warehouse;

use crate::config::ServiceConfig;
use crate::locks::{EntityKey, EntityLocks};
use crate::record_store::{InMemoryRecordStore, RecordStore, StoreError};

pub mod dashboard;
pub mod inventory;
pub mod reference;
pub mod shipments;

pub use dashboard::{DashboardSummary, ShipmentMarker, WarehouseMarker};
pub use inventory::ItemFilter;
pub use reference::{CapacityCheck, PartnerFilter, TransportFilter};
pub use shipments::{NewShipment, ShipmentFilter};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Version conflicts outlasted the retry budget, or a caller-supplied
    /// version was stale.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("event serialization failed: {0}")]
    Serialize(String),
}

/// One store per record kind.
#[derive(Clone)]
pub struct Stores {
    pub inventory: Arc<dyn RecordStore<InventoryItem>>,
    pub shipments: Arc<dyn RecordStore<Shipment>>,
    pub warehouses: Arc<dyn RecordStore<Warehouse>>,
    pub transport: Arc<dyn RecordStore<TransportProvider>>,
    pub partners: Arc<dyn RecordStore<Partner>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            inventory: Arc::new(InMemoryRecordStore::new()),
            shipments: Arc::new(InMemoryRecordStore::new()),
            warehouses: Arc::new(InMemoryRecordStore::new()),
            transport: Arc::new(InMemoryRecordStore::new()),
            partners: Arc::new(InMemoryRecordStore::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub max_conflict_retries: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for ServiceSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_conflict_retries: config.max_conflict_retries,
        }
    }
}

pub struct LogisticsService<B> {
    stores: Stores,
    bus: B,
    locks: EntityLocks,
    settings: ServiceSettings,
}

impl<B> LogisticsService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(stores: Stores, bus: B, settings: ServiceSettings) -> Self {
        Self {
            stores,
            bus,
            locks: EntityLocks::new(),
            settings,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    fn key<R: Record>(organization_id: OrganizationId, id: R::Id) -> EntityKey
    where
        R::Id: Into<Uuid>,
    {
        EntityKey::new(organization_id, R::KIND, id)
    }

    /// Run `attempt` until it stops failing with a version conflict.
    ///
    /// Each attempt must re-read and re-validate. Conflicts beyond the retry
    /// budget surface as [`ServiceError::Conflict`]; domain rejections are
    /// logged and returned untouched.
    fn with_retries<T>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut retries = 0;
        loop {
            match attempt() {
                Err(ServiceError::Store(StoreError::Concurrency(msg)))
                    if retries < self.settings.max_conflict_retries =>
                {
                    retries += 1;
                    warn!(operation, retries, reason = %msg, "version conflict, retrying");
                }
                Err(ServiceError::Store(StoreError::Concurrency(msg))) => {
                    warn!(operation, retries, reason = %msg, "version conflict, giving up");
                    return Err(ServiceError::Conflict(msg));
                }
                Err(ServiceError::Domain(err)) => {
                    warn!(operation, error = %err, "operation rejected");
                    return Err(ServiceError::Domain(err));
                }
                other => return other,
            }
        }
    }

    /// Log a domain rejection that happens outside [`Self::with_retries`].
    fn checked<T>(&self, operation: &'static str, result: Result<T, DomainError>) -> Result<T, ServiceError> {
        result.map_err(|err| {
            warn!(operation, error = %err, "operation rejected");
            ServiceError::Domain(err)
        })
    }

    /// Publish one event for a stored record. `sequence` is the record version
    /// the write produced.
    fn publish<E>(
        &self,
        organization_id: OrganizationId,
        entity_id: impl Into<Uuid>,
        entity_type: &'static str,
        sequence: u64,
        event: &E,
    ) -> Result<(), ServiceError>
    where
        E: Event + Serialize,
    {
        let envelope =
            EventEnvelope::from_event(organization_id, entity_id.into(), entity_type, sequence, event)
                .map_err(|e| ServiceError::Serialize(e.to_string()))?;
        self.bus
            .publish(envelope)
            .map_err(|e| ServiceError::Publish(format!("{e:?}")))
    }
}

fn not_found(kind: &str, id: impl core::fmt::Display) -> ServiceError {
    ServiceError::Store(StoreError::NotFound(format!("{kind} {id}")))
}
