//! Process-wide service wiring shared by every handler.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{debug, info, warn};

use relieftrack_auth::{AdminCredentials, Hs256Tokens, JwtClaims, Role, TokenError};
use relieftrack_core::{OrganizationId, UserId};
use relieftrack_events::{EventBus, EventEnvelope, InMemoryEventBus};
use relieftrack_infra::{AppConfig, LogisticsService, ServiceError, ServiceSettings, Stores};

use crate::app::errors;

pub type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type Logistics = LogisticsService<Bus>;

const DEV_JWT_SECRET: &str = "dev-secret";

pub struct AppServices {
    logistics: Logistics,
    tokens: Hs256Tokens,
    admin: Option<AdminCredentials>,
    admin_user_id: UserId,
    organization_id: OrganizationId,
    token_ttl: chrono::Duration,
    realtime_tx: broadcast::Sender<EventEnvelope<JsonValue>>,
}

/// A signed token for the configured administrator.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Self {
        let secret = match &config.auth.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("JWT_SECRET not set; using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let admin = config
            .auth
            .admin_password
            .as_ref()
            .map(|password| AdminCredentials::new(config.auth.admin_email.clone(), password.clone()));
        if admin.is_none() {
            warn!("no admin password configured; login is disabled");
        }

        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let logistics = LogisticsService::new(
            Stores::in_memory(),
            bus,
            ServiceSettings::from(&config.service),
        );

        // Realtime channel (SSE): lossy broadcast, organization-filtered per stream.
        let (realtime_tx, _realtime_rx) = broadcast::channel(config.realtime.broadcast_capacity);
        spawn_realtime_bridge(logistics.bus(), realtime_tx.clone());

        Self {
            logistics,
            tokens: Hs256Tokens::new(secret.as_bytes()),
            admin,
            admin_user_id: UserId::new(),
            organization_id: config.auth.organization_id,
            token_ttl: config.token_ttl(),
            realtime_tx,
        }
    }

    pub fn tokens(&self) -> &Hs256Tokens {
        &self.tokens
    }

    pub fn logistics(&self) -> &Logistics {
        &self.logistics
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<EventEnvelope<JsonValue>> {
        &self.realtime_tx
    }

    /// Exchange admin credentials for a token. `None` when they do not match
    /// or login is disabled.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Option<Result<IssuedToken, TokenError>> {
        let admin = self.admin.as_ref()?;
        if !admin.verify(email, password) {
            return None;
        }

        let claims = JwtClaims::new(
            self.admin_user_id,
            self.organization_id,
            admin.email.trim().to_lowercase(),
            vec![Role::admin()],
            now,
            self.token_ttl,
        );
        Some(self.tokens.issue(&claims).map(|token| {
            info!(user_id = %claims.sub, "admin logged in");
            IssuedToken { token, claims }
        }))
    }

    /// Run a blocking service operation off the async executor.
    pub async fn run<T, F>(self: &Arc<Self>, op: F) -> Result<T, axum::response::Response>
    where
        T: Send + 'static,
        F: FnOnce(&Logistics) -> Result<T, ServiceError> + Send + 'static,
    {
        let services = Arc::clone(self);
        match tokio::task::spawn_blocking(move || op(&services.logistics)).await {
            Ok(result) => result.map_err(errors::service_error_to_response),
            Err(e) => Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                e.to_string(),
            )),
        }
    }
}

/// Forward every bus envelope to the realtime broadcast channel.
///
/// Runs on a dedicated thread; it exits once the bus is dropped.
fn spawn_realtime_bridge(bus: &Bus, realtime_tx: broadcast::Sender<EventEnvelope<JsonValue>>) {
    let sub = bus.subscribe();
    let spawned = std::thread::Builder::new()
        .name("realtime-bridge".into())
        .spawn(move || {
            while let Ok(env) = sub.recv() {
                // Err only means no stream is open.
                if realtime_tx.send(env).is_err() {
                    debug!("no realtime subscribers");
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start realtime bridge; /stream will stay silent");
    }
}

/// SSE stream of one organization's change notifications.
///
/// Each event is named after its event type; the data is the full envelope.
pub fn organization_sse_stream(
    services: Arc<AppServices>,
    organization_id: OrganizationId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(env) if env.organization_id() == organization_id => {
            let data = serde_json::to_string(&env).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default()
                .event(env.event_type().to_string())
                .data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
