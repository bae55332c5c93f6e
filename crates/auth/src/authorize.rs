use thiserror::Error;

use relieftrack_core::OrganizationId;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("organization mismatch")]
    OrganizationMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for `required` within `active_organization`.
///
/// No IO, no panics. Wildcard `"*"` grants every permission.
pub fn authorize(
    principal: &Principal,
    active_organization: OrganizationId,
    required: &Permission,
) -> Result<(), AuthzError> {
    if principal.organization_id != active_organization {
        return Err(AuthzError::OrganizationMismatch);
    }

    if principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required)
    {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JwtClaims, Role};
    use chrono::{Duration, Utc};
    use relieftrack_core::UserId;

    fn principal(role: &'static str, org: OrganizationId) -> Principal {
        Principal::from_claims(&JwtClaims::new(
            UserId::new(),
            org,
            "user@relief.org",
            vec![Role::new(role)],
            Utc::now(),
            Duration::minutes(5),
        ))
    }

    #[test]
    fn admin_may_do_anything_in_its_organization() {
        let org = OrganizationId::new();
        let p = principal("admin", org);
        assert!(authorize(&p, org, &Permission::new("partners.write")).is_ok());
        assert_eq!(
            authorize(&p, OrganizationId::new(), &Permission::new("partners.write")),
            Err(AuthzError::OrganizationMismatch)
        );
    }

    #[test]
    fn viewer_cannot_write() {
        let org = OrganizationId::new();
        let p = principal("viewer", org);
        assert!(authorize(&p, org, &Permission::new("shipments.read")).is_ok());
        assert_eq!(
            authorize(&p, org, &Permission::new("shipments.write")),
            Err(AuthzError::Forbidden("shipments.write".into()))
        );
    }
}
