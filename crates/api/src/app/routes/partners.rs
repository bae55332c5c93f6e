//! Partner organizations. Email addresses are unique per organization.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use relieftrack_core::PartnerId;
use relieftrack_infra::PartnerFilter;
use relieftrack_partners::PartnerFields;

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
        .route("/:id", get(fetch).put(replace).delete(remove))
        .route("/:id/rating", patch(set_rating))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<PartnerFilter>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.read")?;
    let organization_id = organization.organization_id();
    let records = services
        .run(move |svc| svc.list_partners(organization_id, filter))
        .await?;
    Ok(Json(records).into_response())
}

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PartnerSearchQuery>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.read")?;
    let organization_id = organization.organization_id();
    let records = services
        .run(move |svc| svc.search_partners(organization_id, &query.q, query.filter()))
        .await?;
    Ok(Json(records).into_response())
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(fields): Json<PartnerFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.write")?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| svc.create_partner(organization_id, fields, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.read")?;
    let organization_id = organization.organization_id();
    let stats = services.run(move |svc| svc.partner_statistics(organization_id)).await?;
    Ok(Json(stats).into_response())
}

pub async fn fetch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.read")?;
    let id = errors::parse_id::<PartnerId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services.run(move |svc| svc.get_partner(organization_id, id)).await?;
    Ok(Json(record).into_response())
}

pub async fn replace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(fields): Json<PartnerFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.write")?;
    let id = errors::parse_id::<PartnerId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| {
            svc.replace_partner(organization_id, id, fields, version.expected_version, Utc::now())
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
    authz::require(&organization, &principal, "partners.write")?;
    let id = errors::parse_id::<PartnerId>(&id)?;
    let organization_id = organization.organization_id();
    services
        .run(move |svc| svc.delete_partner(organization_id, id, version.expected_version))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn set_rating(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RatingRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "partners.write")?;
    let id = errors::parse_id::<PartnerId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| svc.set_partner_rating(organization_id, id, body.rating, Utc::now()))
        .await?;
    Ok(Json(record).into_response())
}
