use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

/// Map markers and headline statistics.
pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "dashboard.read")?;
    let organization_id = organization.organization_id();
    let summary = services
        .run(move |svc| svc.dashboard_summary(organization_id))
        .await?;
    Ok(Json(summary).into_response())
}
