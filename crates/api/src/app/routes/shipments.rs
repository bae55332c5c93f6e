use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use relieftrack_core::ShipmentId;
use relieftrack_infra::{NewShipment, ShipmentFilter};

use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_shipments).post(create_shipment))
        .route("/stats", get(statistics))
        .route("/tracking/:tracking_number", get(get_by_tracking_number))
        .route("/:id", get(get_shipment))
        .route("/:id/status", post(set_status))
}

/// Newest first.
pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<ShipmentFilter>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.read")?;
    let organization_id = organization.organization_id();
    let shipments = services
        .run(move |svc| svc.list_shipments(organization_id, filter))
        .await?;
    Ok(Json(shipments).into_response())
}

/// Reserve stock for every line and create the shipment, or change nothing.
pub async fn create_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewShipment>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.write")?;
    let organization_id = organization.organization_id();
    let created_by = principal.user_id();
    let shipment = services
        .run(move |svc| svc.create_shipment(organization_id, body, Some(created_by), Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(shipment)).into_response())
}

pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.read")?;
    let organization_id = organization.organization_id();
    let stats = services
        .run(move |svc| svc.shipment_statistics(organization_id))
        .await?;
    Ok(Json(stats).into_response())
}

pub async fn get_by_tracking_number(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(tracking_number): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.read")?;
    let organization_id = organization.organization_id();
    let shipment = services
        .run(move |svc| svc.find_shipment_by_tracking_number(organization_id, &tracking_number))
        .await?;
    Ok(Json(shipment).into_response())
}

pub async fn get_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.read")?;
    let shipment_id = errors::parse_id::<ShipmentId>(&id)?;
    let organization_id = organization.organization_id();
    let shipment = services
        .run(move |svc| svc.get_shipment(organization_id, shipment_id))
        .await?;
    Ok(Json(shipment).into_response())
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> ApiResult {
    authz::require(&organization, &principal, "shipments.write")?;
    let shipment_id = errors::parse_id::<ShipmentId>(&id)?;
    let organization_id = organization.organization_id();
    let shipment = services
        .run(move |svc| {
            svc.set_shipment_status(organization_id, shipment_id, body.status, body.notes, Utc::now())
        })
        .await?;
    Ok(Json(shipment).into_response())
}
