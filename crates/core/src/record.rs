//! Record contract: identity + organization scope + optimistic version.

use crate::id::OrganizationId;

/// A persisted domain record.
///
/// Every record is owned by exactly one organization and carries a
/// monotonically increasing version that the record store bumps on each
/// successful write. Versions start at 1 for a freshly inserted record; an
/// unsaved record reports 0.
pub trait Record: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Strongly-typed record identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Stable record kind (e.g. "inventory.item"), used for envelopes and logs.
    const KIND: &'static str;

    /// Returns the record identifier.
    fn id(&self) -> Self::Id;

    /// Owning organization.
    fn organization_id(&self) -> OrganizationId;

    /// Current stored version (0 before the first write).
    fn version(&self) -> u64;

    /// Set by the record store after a successful write.
    fn set_version(&mut self, version: u64);

    /// Secondary keys that must be unique within an organization.
    ///
    /// Each entry is `(key name, value)`; the store rejects an insert or update
    /// whose value collides with another record of the same kind.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Optimistic concurrency expectation for a record write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for idempotent updates, migrations, etc.).
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_every_version() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(42));
    }

    #[test]
    fn exact_rejects_stale_versions() {
        assert!(ExpectedVersion::Exact(3).matches(3));
        assert!(!ExpectedVersion::Exact(3).matches(4));
    }
}
