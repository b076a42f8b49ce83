//! Health check endpoints
//!
//! The check reads the catalog size through the protocol engine, so a
//! repository whose provider cannot be queried reports itself degraded.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
}

/// Health check handler
async fn health(State(state): State<AppState>) -> Response {
    metrics::counter!("oaipmh_health_checks_total").increment(1);

    let repository = state.engine.config().base_url.clone();
    let (status, code, records) = match state.engine.record_count().await {
        Ok(count) => ("healthy", StatusCode::OK, Some(count)),
        Err(e) => {
            warn!("Health check could not count records: {}", e);
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, None)
        }
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        repository,
        records,
    };
    (code, Json(body)).into_response()
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
