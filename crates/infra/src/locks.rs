//! In-process per-entity locks.
//!
//! A service holds the locks of every entity it touches for the whole
//! validate, write, publish sequence. Keys are taken all at once, so two
//! operations over overlapping sets of entities cannot deadlock.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use relieftrack_core::OrganizationId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub organization_id: OrganizationId,
    pub kind: &'static str,
    pub id: Uuid,
}

impl EntityKey {
    pub fn new(organization_id: OrganizationId, kind: &'static str, id: impl Into<Uuid>) -> Self {
        Self {
            organization_id,
            kind,
            id: id.into(),
        }
    }
}

/// Lock table keyed by entity.
#[derive(Debug, Default)]
pub struct EntityLocks {
    held: Mutex<HashSet<EntityKey>>,
    released: Condvar,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashSet<EntityKey>> {
        // The table only holds keys; a panic elsewhere cannot leave it inconsistent.
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every key is free, then hold them all.
    ///
    /// Duplicate keys are collapsed; acquisition order is the sorted key order.
    pub fn acquire(&self, keys: impl IntoIterator<Item = EntityKey>) -> EntityGuard<'_> {
        let keys: BTreeSet<EntityKey> = keys.into_iter().collect();
        let mut held = self.table();
        while keys.iter().any(|k| held.contains(k)) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.extend(keys.iter().copied());

        EntityGuard { locks: self, keys }
    }

    pub fn acquire_one(&self, key: EntityKey) -> EntityGuard<'_> {
        self.acquire([key])
    }

    pub fn held_count(&self) -> usize {
        self.table().len()
    }
}

/// Releases its keys on drop.
#[derive(Debug)]
pub struct EntityGuard<'a> {
    locks: &'a EntityLocks,
    keys: BTreeSet<EntityKey>,
}

impl EntityGuard<'_> {
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.keys.iter()
    }
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.table();
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
