use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, sse::Event as SseEvent},
};
use chrono::Utc;

use crate::app::dto::{LoginRequest, LoginResponse, LoginUser};
use crate::app::errors;
use crate::app::routes::ApiResult;
use crate::app::services::{self, AppServices};
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult {
    let issued = match services.login(&body.email, &body.password, Utc::now()) {
        Some(Ok(issued)) => issued,
        Some(Err(e)) => {
            return Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                e.to_string(),
            ));
        }
        None => {
            tracing::warn!("login rejected");
            return Err(errors::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid email or password",
            ));
        }
    };

    let expires_at = issued.claims.expires_at();
    let claims = issued.claims;
    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at,
        user: LoginUser {
            id: claims.sub,
            email: claims.email,
            roles: claims.roles,
            organization_id: claims.organization_id,
        },
    })
    .into_response())
}

pub async fn whoami(
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "organization_id": organization.organization_id().to_string(),
        "user_id": principal.user_id().to_string(),
        "email": principal.email(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(organization): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<
    axum::response::Sse<
        impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>,
    >,
    axum::response::Response,
> {
    authz::require(&organization, &principal, "events.read")?;
    Ok(services::organization_sse_stream(
        services,
        organization.organization_id(),
    ))
}
