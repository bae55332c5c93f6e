use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque strings of the form `<area>.<action>`
/// (e.g. "inventory.write"). The wildcard `"*"` allows everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

const READ_ALL: &[&str] = &[
    "inventory.read",
    "shipments.read",
    "warehouses.read",
    "transport.read",
    "partners.read",
    "dashboard.read",
    "events.read",
];

const COORDINATOR_WRITE: &[&str] = &["inventory.write", "shipments.write"];

/// Static role→permission policy.
///
/// - `admin`: everything
/// - `coordinator`: read everything, write inventory and shipments
/// - `viewer`: read everything
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == Role::ADMIN) {
        return vec![Permission::new("*")];
    }

    let mut granted: Vec<&'static str> = Vec::new();
    for role in roles {
        match role.as_str() {
            Role::COORDINATOR => {
                granted.extend_from_slice(READ_ALL);
                granted.extend_from_slice(COORDINATOR_WRITE);
            }
            Role::VIEWER => granted.extend_from_slice(READ_ALL),
            _ => {}
        }
    }

    granted.sort_unstable();
    granted.dedup();
    granted.into_iter().map(Permission::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(perms: &[Permission]) -> Vec<&str> {
        perms.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn admin_gets_wildcard() {
        let perms = permissions_for_roles(&[Role::new("viewer"), Role::admin()]);
        assert_eq!(names(&perms), vec!["*"]);
        assert!(perms[0].is_wildcard());
    }

    #[test]
    fn coordinator_writes_stock_and_shipments_only() {
        let perms = permissions_for_roles(&[Role::new("coordinator")]);
        let names = names(&perms);
        assert!(names.contains(&"inventory.write"));
        assert!(names.contains(&"shipments.write"));
        assert!(names.contains(&"warehouses.read"));
        assert!(!names.contains(&"warehouses.write"));
    }

    #[test]
    fn viewer_reads_only_and_unknown_roles_get_nothing() {
        let perms = permissions_for_roles(&[Role::new("viewer"), Role::new("viewer")]);
        assert_eq!(perms.len(), READ_ALL.len());
        assert!(perms.iter().all(|p| p.as_str().ends_with(".read")));

        assert!(permissions_for_roles(&[Role::new("intern")]).is_empty());
    }
}
