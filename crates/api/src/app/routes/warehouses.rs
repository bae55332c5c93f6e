//! Warehouse sites. Deleting a site that still stocks items is rejected.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use relieftrack_core::WarehouseId;
use relieftrack_warehouses::WarehouseFields;

use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/stats", get(statistics))
        .route("/:id", get(fetch).put(replace).delete(remove))
        .route("/:id/utilization", patch(set_utilization))
        .route("/:id/capacity", get(capacity))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.read")?;
    let organization_id = organization.organization_id();
    let records = services.run(move |svc| svc.list_warehouses(organization_id)).await?;
    Ok(Json(records).into_response())
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(fields): Json<WarehouseFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.write")?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| svc.create_warehouse(organization_id, fields, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.read")?;
    let organization_id = organization.organization_id();
    let stats = services.run(move |svc| svc.warehouse_statistics(organization_id)).await?;
    Ok(Json(stats).into_response())
}

pub async fn fetch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.read")?;
    let id = errors::parse_id::<WarehouseId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services.run(move |svc| svc.get_warehouse(organization_id, id)).await?;
    Ok(Json(record).into_response())
}

pub async fn replace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(fields): Json<WarehouseFields>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.write")?;
    let id = errors::parse_id::<WarehouseId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| {
            svc.replace_warehouse(organization_id, id, fields, version.expected_version, Utc::now())
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
    authz::require(&organization, &principal, "warehouses.write")?;
    let id = errors::parse_id::<WarehouseId>(&id)?;
    let organization_id = organization.organization_id();
    services
        .run(move |svc| svc.delete_warehouse(organization_id, id, version.expected_version))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn set_utilization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UtilizationRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.write")?;
    let id = errors::parse_id::<WarehouseId>(&id)?;
    let organization_id = organization.organization_id();
    let record = services
        .run(move |svc| {
            svc.set_warehouse_utilization(organization_id, id, body.utilization, Utc::now())
        })
        .await?;
    Ok(Json(record).into_response())
}

/// Whether the free share of the site covers `?required=` square meters.
pub async fn capacity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::CapacityQuery>,
) -> ApiResult {
    authz::require(&organization, &principal, "warehouses.read")?;
    let id = errors::parse_id::<WarehouseId>(&id)?;
    let organization_id = organization.organization_id();
    let check = services
        .run(move |svc| svc.warehouse_can_accept(organization_id, id, query.required))
        .await?;
    Ok(Json(check).into_response())
}
