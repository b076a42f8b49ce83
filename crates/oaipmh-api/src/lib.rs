//! OAI-PMH HTTP API
//!
//! This crate provides the Axum-based HTTP surface of the repository:
//! the `/oai` endpoint with its XML rendering, health checks and metrics.

pub mod error;
pub mod render;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
