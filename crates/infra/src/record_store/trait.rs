use std::sync::Arc;

use thiserror::Error;

use relieftrack_core::{ExpectedVersion, OrganizationId, Record};

/// Record store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, isolation) as
/// opposed to domain errors (validation, stock rules). A failed store call
/// never leaves a partial write behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("organization isolation violation: {0}")]
    OrganizationIsolation(String),

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Organization-scoped, versioned record storage.
///
/// One record per `(organization, id)`. Every successful write bumps the
/// stored version by one; inserts start at version 1.
///
/// Implementations must:
/// - enforce organization isolation (a record is only visible to its owner)
/// - enforce optimistic concurrency on every update and delete
/// - keep `unique_keys` unique per organization and record kind
/// - apply `update_batch` atomically (every record is written, or none)
pub trait RecordStore<R: Record>: Send + Sync {
    fn get(&self, organization_id: OrganizationId, id: R::Id) -> Result<Option<R>, StoreError>;

    /// All records of an organization, ordered by id.
    fn list(&self, organization_id: OrganizationId) -> Result<Vec<R>, StoreError>;

    /// Store a new record. Returns it with its assigned version.
    fn insert(&self, record: R) -> Result<R, StoreError>;

    /// Overwrite an existing record after checking its stored version.
    fn update(&self, record: R, expected: ExpectedVersion) -> Result<R, StoreError>;

    /// Update several records of one organization in one atomic step.
    fn update_batch(&self, records: Vec<(R, ExpectedVersion)>) -> Result<Vec<R>, StoreError>;

    fn delete(
        &self,
        organization_id: OrganizationId,
        id: R::Id,
        expected: ExpectedVersion,
    ) -> Result<R, StoreError>;

    /// Records of an organization matching `predicate`, ordered by id.
    fn find(
        &self,
        organization_id: OrganizationId,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError> {
        Ok(self
            .list(organization_id)?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }
}

impl<R, S> RecordStore<R> for Arc<S>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    fn get(&self, organization_id: OrganizationId, id: R::Id) -> Result<Option<R>, StoreError> {
        (**self).get(organization_id, id)
    }

    fn list(&self, organization_id: OrganizationId) -> Result<Vec<R>, StoreError> {
        (**self).list(organization_id)
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        (**self).insert(record)
    }

    fn update(&self, record: R, expected: ExpectedVersion) -> Result<R, StoreError> {
        (**self).update(record, expected)
    }

    fn update_batch(&self, records: Vec<(R, ExpectedVersion)>) -> Result<Vec<R>, StoreError> {
        (**self).update_batch(records)
    }

    fn delete(
        &self,
        organization_id: OrganizationId,
        id: R::Id,
        expected: ExpectedVersion,
    ) -> Result<R, StoreError> {
        (**self).delete(organization_id, id, expected)
    }

    fn find(
        &self,
        organization_id: OrganizationId,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError> {
        (**self).find(organization_id, predicate)
    }
}
