use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use relieftrack_core::InventoryItemId;
use relieftrack_infra::ItemFilter;
use relieftrack_inventory::ItemDetailsPatch;

use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/stats", get(statistics))
        .route("/refresh-status", post(refresh_statuses))
        .route(
            "/:id",
            get(get_item).patch(update_item).delete(remove_item),
        )
        .route("/:id/adjust", post(adjust_quantity))
        .route("/:id/quarantine", post(set_quarantine))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.read")?;
    let organization_id = organization.organization_id();
    let items = services
        .run(move |svc| svc.list_items(organization_id, filter))
        .await?;
    Ok(Json(items).into_response())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateItemRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let organization_id = organization.organization_id();
    let item = services
        .run(move |svc| {
            svc.create_item(
                organization_id,
                body.warehouse_id,
                body.details,
                body.quantity,
                Utc::now(),
            )
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.read")?;
    let organization_id = organization.organization_id();
    let stats = services
        .run(move |svc| svc.inventory_statistics(organization_id))
        .await?;
    Ok(Json(stats).into_response())
}

/// Re-derive time-dependent statuses (expiry); returns the items that changed.
pub async fn refresh_statuses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let organization_id = organization.organization_id();
    let changed = services
        .run(move |svc| svc.refresh_statuses(organization_id, Utc::now()))
        .await?;
    Ok(Json(changed).into_response())
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.read")?;
    let item_id = errors::parse_id::<InventoryItemId>(&id)?;
    let organization_id = organization.organization_id();
    let item = services
        .run(move |svc| svc.get_item(organization_id, item_id))
        .await?;
    Ok(Json(item).into_response())
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<ItemDetailsPatch>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let item_id = errors::parse_id::<InventoryItemId>(&id)?;
    let organization_id = organization.organization_id();
    let item = services
        .run(move |svc| svc.update_item(organization_id, item_id, patch, Utc::now()))
        .await?;
    Ok(Json(item).into_response())
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let item_id = errors::parse_id::<InventoryItemId>(&id)?;
    let organization_id = organization.organization_id();
    services
        .run(move |svc| svc.remove_item(organization_id, item_id, Utc::now()))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn adjust_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustQuantityRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let item_id = errors::parse_id::<InventoryItemId>(&id)?;
    let organization_id = organization.organization_id();
    let item = services
        .run(move |svc| svc.adjust_quantity(organization_id, item_id, body.delta, Utc::now()))
        .await?;
    Ok(Json(item).into_response())
}

pub async fn set_quarantine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::QuarantineRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "inventory.write")?;
    let item_id = errors::parse_id::<InventoryItemId>(&id)?;
    let organization_id = organization.organization_id();
    let item = services
        .run(move |svc| {
            svc.set_quarantine(organization_id, item_id, body.quarantined, Utc::now())
        })
        .await?;
    Ok(Json(item).into_response())
}
