//! HTTP handlers.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::json;

use super::ServerState;
use crate::audit_engine::AuditError;
use crate::sitemap::SitemapError;

const STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// `POST /api/analyze`: validate, then stream tagged lines until the batch
/// ends. A client disconnect drops the body stream, which aborts the batch.
pub async fn analyze_handler(State(state): State<ServerState>, body: Bytes) -> Response {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {e}")),
    };

    let stream = match state.orchestrator.start_json(value) {
        Ok(stream) => stream,
        Err(AuditError::InvalidRequest(message)) => {
            return json_error(StatusCode::BAD_REQUEST, message);
        }
        Err(e) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let lines = stream
        .into_wire_lines()
        .map(Ok::<_, Infallible>);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}

/// `GET /api/sitemap?url=<domain>`
pub async fn sitemap_handler(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let site = params.get("url").map(String::as_str).unwrap_or_default();

    match state.sitemaps.discover(site).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e @ SitemapError::MissingUrl) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ (SitemapError::NotFound | SitemapError::Empty)) => {
            json_error(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}
