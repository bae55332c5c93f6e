//! API-side authorization guard.
//!
//! Handlers check the permission an endpoint needs before calling the
//! service, keeping the service layer auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;
use tracing::warn;

use relieftrack_auth::{AuthzError, Permission, authorize};

use crate::app::errors::json_error;
use crate::context::{OrganizationContext, PrincipalContext};

/// Check `permission` for the current request; a 403 response on failure.
pub fn require(
    organization: &OrganizationContext,
    principal: &PrincipalContext,
    permission: &'static str,
) -> Result<(), Response> {
    authorize(
        principal.principal(),
        organization.organization_id(),
        &Permission::new(permission),
    )
    .map_err(|e| {
        warn!(user_id = %principal.user_id(), permission, error = %e, "request forbidden");
        match e {
            AuthzError::OrganizationMismatch => {
                json_error(StatusCode::FORBIDDEN, "organization_mismatch", e.to_string())
            }
            AuthzError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        }
    })
}
