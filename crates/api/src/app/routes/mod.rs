use axum::{Router, routing::get};

pub mod dashboard;
pub mod inventory;
pub mod partners;
pub mod shipments;
pub mod system;
pub mod transport;
pub mod warehouses;

/// Handler result: both arms are complete responses.
pub type ApiResult = Result<axum::response::Response, axum::response::Response>;

/// Router for all authenticated (organization-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .route("/dashboard", get(dashboard::summary))
        .nest("/inventory", inventory::router())
        .nest("/shipments", shipments::router())
        .nest("/warehouses", warehouses::router())
        .nest("/transport", transport::router())
        .nest("/partners", partners::router())
}
