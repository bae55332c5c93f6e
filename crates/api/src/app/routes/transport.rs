use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use relieftrack_core::TransportId;
use relieftrack_infra::TransportFilter;
use relieftrack_partners::{TransportFields, TransportType};

use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/stats", get(statistics))
        .route("/search", get(search))
        .route("/available/:type/:area", get(available))
        .route("/:id", get(fetch).put(replace).delete(remove))
        .route("/:id/availability", patch(set_availability))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<TransportFilter>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.read")?;
    let organization_id = organization.organization_id();
    let records = services
        .run(move |svc| svc.list_transport(organization_id, filter))
        .await?;
    Ok(Json(records).into_response())
}

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::TransportSearchQuery>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.read")?;
    let organization_id = organization.organization_id();
    let records = services
        .run(move |svc| svc.search_transport(organization_id, &query.q, query.filter()))
        .await?;
    Ok(Json(records).into_response())
}

/// `type` uses the display names, e.g. `Road%20Trucking`.
pub async fn available(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((transport_type, area)): Path<(TransportType, String)>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.read")?;
    let organization_id = organization.organization_id();
    let records = services
        .run(move |svc| svc.available_transport(organization_id, transport_type, &area))
        .await?;
    Ok(Json(records).into_response())
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(fields): Json<TransportFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.write")?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| svc.create_transport(organization_id, fields, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.read")?;
    let organization_id = organization.organization_id();
    let stats = services.run(move |svc| svc.transport_statistics(organization_id)).await?;
    Ok(Json(stats).into_response())
}

pub async fn fetch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.read")?;
    let id = errors::parse_id::<TransportId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services.run(move |svc| svc.get_transport(organization_id, id)).await?;
    Ok(Json(record).into_response())
}

pub async fn replace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(fields): Json<TransportFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.write")?;
    let id = errors::parse_id::<TransportId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| {
            svc.replace_transport(organization_id, id, fields, version.expected_version, Utc::now())
        })
        .await?;
    Ok(Json(record).into_response())
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.write")?;
    let id = errors::parse_id::<TransportId>(&id)?;
    let organization_id = organization.organization_id();
    services
        .run(move |svc| svc.delete_transport(organization_id, id, version.expected_version))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn set_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AvailabilityRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "transport.write")?;
    let id = errors::parse_id::<TransportId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| {
            svc.set_transport_availability(organization_id, id, body.availability, Utc::now())
        })
        .await?;
    Ok(Json(record).into_response())
}
