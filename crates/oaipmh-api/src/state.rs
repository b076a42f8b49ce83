//! Application state

use oaipmh_core::ProtocolEngine;
use std::sync::Arc;

/// Prometheus recorder handle rendered by `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProtocolEngine>,
}

impl AppState {
    pub fn new(engine: Arc<ProtocolEngine>) -> Self {
        Self { engine }
    }
}
