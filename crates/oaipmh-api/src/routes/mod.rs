//! API routes

mod health;
pub mod metrics;
mod oai;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Form-encoded OAI-PMH requests are small
const MAX_REQUEST_BODY: usize = 64 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(oai::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
