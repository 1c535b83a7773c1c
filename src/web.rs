//! Axum-based HTTP server exposing the registry as JSON

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{EessError, Result};
use crate::poller::{PollerHandle, PollerStatus};
use crate::publisher::StationAttributes;
use crate::registry::SensorRegistry;
use crate::sensor::SensorDescription;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<SensorRegistry>>,
}

impl AppState {
    pub fn new(registry: SensorRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
        }
    }
}

/// One running sensor as seen by API clients
#[derive(Debug, Clone, Serialize)]
pub struct SensorView {
    #[serde(flatten)]
    pub description: SensorDescription,
    pub state: Option<f64>,
    pub attributes: Option<StationAttributes>,
    pub poller: PollerStatus,
}

impl SensorView {
    pub fn from_handle(handle: &PollerHandle) -> Self {
        let published = handle.state();
        Self {
            description: handle.description().clone(),
            state: published.price(),
            attributes: published.attributes().cloned(),
            poller: handle.status(),
        }
    }
}

/// An entry whose first refresh failed
#[derive(Debug, Clone, Serialize)]
pub struct FailedView {
    pub entry_id: String,
    pub municipality_name: String,
    pub fuel_type: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorList {
    pub sensors: Vec<SensorView>,
    pub failed: Vec<FailedView>,
}

fn not_found(entry_id: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("unknown entry '{entry_id}'") })),
    )
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("APP_VERSION"),
        "sensors": registry.len(),
    }))
}

async fn list_sensors(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    Json(SensorList {
        sensors: registry.handles().map(SensorView::from_handle).collect(),
        failed: registry
            .failed()
            .map(|(entry_id, entry)| FailedView {
                entry_id: entry_id.to_string(),
                municipality_name: entry.config.municipality_name.clone(),
                fuel_type: entry.config.fuel_type.key().to_string(),
                error: entry.error.clone(),
            })
            .collect(),
    })
}

async fn get_sensor(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> axum::response::Response {
    let registry = state.registry.read().await;
    match registry.get(&entry_id) {
        Some(handle) => Json(SensorView::from_handle(handle)).into_response(),
        None => not_found(&entry_id).into_response(),
    }
}

async fn refresh_sensor(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> axum::response::Response {
    let registry = state.registry.read().await;
    let Some(handle) = registry.get(&entry_id) else {
        return not_found(&entry_id).into_response();
    };
    if handle.request_refresh() {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "queued" })),
        )
            .into_response()
    } else {
        (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "poller is stopped" })),
        )
            .into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{entry_id}", get(get_sensor))
        .route("/api/sensors/{entry_id}/refresh", post(refresh_sensor))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until `shutdown` resolves
///
/// Bind and accept-loop failures come back as [`EessError::Web`].
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={host}, port={port}"
    ));

    let addr: SocketAddr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{host}'; falling back to 127.0.0.1"));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EessError::web(format!("failed to bind {addr}: {e}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| EessError::web(format!("no local address: {e}")))?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| EessError::web(e.to_string()))?;
    logger.info("Web server stopped");
    Ok(())
}
