//! OAI-PMH endpoint
//!
//! `GET /oai?verb=...` and `POST /oai` with a form-encoded body. Protocol
//! errors are answered with HTTP 200 and an `error` element; only failures
//! of the provider or cache store turn into HTTP 500.

use axum::{
    Router,
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use oaipmh_core::{OaiResponse, QueryArguments};
use tracing::debug;

use crate::error::ApiError;
use crate::render::{XML_CONTENT_TYPE, render};
use crate::state::AppState;

/// GET /oai
async fn oai_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    respond(&state, query.as_deref(), None).await
}

/// POST /oai
async fn oai_post(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: String,
) -> Result<Response, ApiError> {
    respond(&state, query.as_deref(), Some(&body)).await
}

async fn respond(
    state: &AppState,
    query: Option<&str>,
    form: Option<&str>,
) -> Result<Response, ApiError> {
    let response = match QueryArguments::parse(query, form) {
        Ok(args) => state.engine.handle(&args).await,
        Err(e) => OaiResponse::rejected(e),
    };
    record_metrics(&response);

    let status = match &response.result {
        Err(e) if !e.code().is_protocol_error() => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    let xml = render(&response, &state.engine.config().base_url, Utc::now())?;
    debug!("OAI response {} ({} bytes)", status, xml.len());

    Ok((status, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response())
}

fn record_metrics(response: &OaiResponse) {
    let verb = response
        .request
        .as_ref()
        .map(|request| request.verb().as_str())
        .unwrap_or("invalid");
    metrics::counter!("oaipmh_requests_total", "verb" => verb).increment(1);

    if let Err(e) = &response.result {
        metrics::counter!("oaipmh_errors_total", "code" => e.code().as_str()).increment(1);
    }
}

/// Create OAI-PMH routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/oai", get(oai_get).post(oai_post))
}
