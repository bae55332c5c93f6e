use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use relieftrack_core::{ExpectedVersion, OrganizationId, Record};

use super::r#trait::{RecordStore, StoreError};

type UniqueKey = (OrganizationId, &'static str, String);

#[derive(Debug)]
struct Tables<R: Record> {
    records: BTreeMap<(OrganizationId, R::Id), R>,
    unique: HashMap<UniqueKey, R::Id>,
}

impl<R: Record> Default for Tables<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            unique: HashMap::new(),
        }
    }
}

impl<R: Record> Tables<R> {
    fn unique_keys_of(record: &R) -> Vec<UniqueKey> {
        let org = record.organization_id();
        record
            .unique_keys()
            .into_iter()
            .map(|(name, value)| (org, name, value))
            .collect()
    }

    fn check_unique(&self, record: &R) -> Result<(), StoreError> {
        for key in Self::unique_keys_of(record) {
            if let Some(owner) = self.unique.get(&key) {
                if *owner != record.id() {
                    return Err(StoreError::Duplicate(format!(
                        "{} with {} '{}' already exists",
                        R::KIND,
                        key.1,
                        key.2
                    )));
                }
            }
        }
        Ok(())
    }

    fn stored_version(&self, record: &R) -> Result<u64, StoreError> {
        self.records
            .get(&(record.organization_id(), record.id()))
            .map(|r| r.version())
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", R::KIND, record.id())))
    }

    /// Write without checks; callers validated version and uniqueness.
    fn write(&mut self, mut record: R, version: u64) -> R {
        let key = (record.organization_id(), record.id());
        if let Some(old) = self.records.get(&key) {
            for k in Self::unique_keys_of(old) {
                self.unique.remove(&k);
            }
        }
        for k in Self::unique_keys_of(&record) {
            self.unique.insert(k, record.id());
        }
        record.set_version(version);
        self.records.insert(key, record.clone());
        record
    }
}

/// In-memory record store.
///
/// Intended for tests/dev and single-process deployments. One instance holds
/// one record kind.
#[derive(Debug)]
pub struct InMemoryRecordStore<R: Record> {
    tables: RwLock<Tables<R>>,
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables<R>>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables<R>>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn version_mismatch<R: Record>(record: &R, expected: ExpectedVersion, actual: u64) -> StoreError {
    StoreError::Concurrency(format!(
        "{} {}: expected {expected:?}, found {actual}",
        R::KIND,
        record.id()
    ))
}

impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    fn get(&self, organization_id: OrganizationId, id: R::Id) -> Result<Option<R>, StoreError> {
        Ok(self.read()?.records.get(&(organization_id, id)).cloned())
    }

    fn list(&self, organization_id: OrganizationId) -> Result<Vec<R>, StoreError> {
        Ok(self
            .read()?
            .records
            .iter()
            .filter(|((org, _), _)| *org == organization_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        let mut tables = self.write()?;
        if tables
            .records
            .contains_key(&(record.organization_id(), record.id()))
        {
            return Err(StoreError::Duplicate(format!("{} {}", R::KIND, record.id())));
        }
        tables.check_unique(&record)?;
        Ok(tables.write(record, 1))
    }

    fn update(&self, record: R, expected: ExpectedVersion) -> Result<R, StoreError> {
        let mut tables = self.write()?;
        let current = tables.stored_version(&record)?;
        if !expected.matches(current) {
            return Err(version_mismatch(&record, expected, current));
        }
        tables.check_unique(&record)?;
        Ok(tables.write(record, current + 1))
    }

    fn update_batch(&self, records: Vec<(R, ExpectedVersion)>) -> Result<Vec<R>, StoreError> {
        let Some(organization_id) = records.first().map(|(r, _)| r.organization_id()) else {
            return Ok(Vec::new());
        };

        let mut ids = HashSet::with_capacity(records.len());
        for (idx, (record, _)) in records.iter().enumerate() {
            if record.organization_id() != organization_id {
                return Err(StoreError::OrganizationIsolation(format!(
                    "batch contains multiple organizations (index {idx})"
                )));
            }
            if !ids.insert(record.id()) {
                return Err(StoreError::InvalidBatch(format!(
                    "{} {} appears more than once",
                    R::KIND,
                    record.id()
                )));
            }
        }

        let mut tables = self.write()?;

        // Validate everything before the first write.
        let mut versions = Vec::with_capacity(records.len());
        let mut claimed = HashSet::new();
        for (record, expected) in &records {
            let current = tables.stored_version(record)?;
            if !expected.matches(current) {
                return Err(version_mismatch(record, *expected, current));
            }
            for key in Tables::unique_keys_of(record) {
                let taken_outside = tables
                    .unique
                    .get(&key)
                    .is_some_and(|owner| *owner != record.id() && !ids.contains(owner));
                if taken_outside || !claimed.insert(key.clone()) {
                    return Err(StoreError::Duplicate(format!(
                        "{} with {} '{}' already exists",
                        R::KIND,
                        key.1,
                        key.2
                    )));
                }
            }
            versions.push(current + 1);
        }

        Ok(records
            .into_iter()
            .zip(versions)
            .map(|((record, _), version)| tables.write(record, version))
            .collect())
    }

    fn delete(
        &self,
        organization_id: OrganizationId,
        id: R::Id,
        expected: ExpectedVersion,
    ) -> Result<R, StoreError> {
        let mut tables = self.write()?;
        let key = (organization_id, id);
        let current = tables
            .records
            .get(&key)
            .map(|r| r.version())
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::KIND)))?;
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "{} {id}: expected {expected:?}, found {current}",
                R::KIND
            )));
        }
        let removed = tables
            .records
            .remove(&key)
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::KIND)))?;
        for k in Tables::unique_keys_of(&removed) {
            tables.unique.remove(&k);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relieftrack_core::WarehouseId;

    #[derive(Debug, Clone, PartialEq)]
    struct Site {
        id: WarehouseId,
        org: OrganizationId,
        code: String,
        version: u64,
    }

    impl Record for Site {
        type Id = WarehouseId;
        const KIND: &'static str = "test.site";

        fn id(&self) -> Self::Id {
            self.id
        }
        fn organization_id(&self) -> OrganizationId {
            self.org
        }
        fn version(&self) -> u64 {
            self.version
        }
        fn set_version(&mut self, version: u64) {
            self.version = version;
        }
        fn unique_keys(&self) -> Vec<(&'static str, String)> {
            vec![("code", self.code.clone())]
        }
    }

    fn site(org: OrganizationId, code: &str) -> Site {
        Site {
            id: WarehouseId::new(),
            org,
            code: code.to_string(),
            version: 0,
        }
    }

    #[test]
    fn insert_assigns_version_one_and_updates_bump() {
        let store = InMemoryRecordStore::new();
        let org = OrganizationId::new();

        let stored = store.insert(site(org, "A")).unwrap();
        assert_eq!(stored.version, 1);

        let updated = store.update(stored.clone(), ExpectedVersion::Exact(1)).unwrap();
        assert_eq!(updated.version, 2);

        let err = store.update(stored, ExpectedVersion::Exact(1)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[test]
    fn organizations_are_isolated() {
        let store = InMemoryRecordStore::new();
        let (a, b) = (OrganizationId::new(), OrganizationId::new());
        let stored = store.insert(site(a, "A")).unwrap();

        assert!(store.get(b, stored.id).unwrap().is_none());
        assert!(store.list(b).unwrap().is_empty());
        // Unique keys are scoped per organization.
        assert!(store.insert(site(b, "A")).is_ok());
    }

    #[test]
    fn unique_keys_are_enforced_and_released() {
        let store = InMemoryRecordStore::new();
        let org = OrganizationId::new();
        let first = store.insert(site(org, "A")).unwrap();

        assert!(matches!(store.insert(site(org, "A")), Err(StoreError::Duplicate(_))));

        let mut renamed = first.clone();
        renamed.code = "B".into();
        store.update(renamed, ExpectedVersion::Any).unwrap();
        assert!(store.insert(site(org, "A")).is_ok());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = InMemoryRecordStore::new();
        let org = OrganizationId::new();
        let a = store.insert(site(org, "A")).unwrap();
        let b = store.insert(site(org, "B")).unwrap();

        let err = store
            .update_batch(vec![
                (a.clone(), ExpectedVersion::Exact(1)),
                (b.clone(), ExpectedVersion::Exact(7)),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert_eq!(store.get(org, a.id).unwrap().unwrap().version, 1);

        let written = store
            .update_batch(vec![(a, ExpectedVersion::Exact(1)), (b, ExpectedVersion::Exact(1))])
            .unwrap();
        assert!(written.iter().all(|r| r.version == 2));
    }

    #[test]
    fn batch_rejects_mixed_organizations() {
        let store = InMemoryRecordStore::new();
        let a = store.insert(site(OrganizationId::new(), "A")).unwrap();
        let b = store.insert(site(OrganizationId::new(), "B")).unwrap();

        let err = store
            .update_batch(vec![(a, ExpectedVersion::Any), (b, ExpectedVersion::Any)])
            .unwrap_err();
        assert!(matches!(err, StoreError::OrganizationIsolation(_)));
    }

    #[test]
    fn delete_checks_version() {
        let store = InMemoryRecordStore::new();
        let org = OrganizationId::new();
        let a = store.insert(site(org, "A")).unwrap();

        assert!(store.delete(org, a.id, ExpectedVersion::Exact(5)).is_err());
        store.delete(org, a.id, ExpectedVersion::Exact(1)).unwrap();
        assert!(store.get(org, a.id).unwrap().is_none());
        assert!(matches!(
            store.delete(org, a.id, ExpectedVersion::Any),
            Err(StoreError::NotFound(_))
        ));
    }
}
