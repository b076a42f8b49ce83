//! API error types

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::render::RenderError;

/// Failures outside the protocol itself
///
/// Protocol errors are part of a normal OAI-PMH response and never reach
/// this type.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to render response: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
