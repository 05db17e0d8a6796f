//! Provenance check: only requests tagged by the gateway get through.

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

pub const INTERNAL_AUTH_HEADER: &str = "x-internal-auth";
pub const DEFAULT_INTERNAL_MARKER: &str = "gateway-service";

/// Whether `headers` carry exactly the expected provenance marker.
#[must_use]
pub fn is_from_gateway(headers: &HeaderMap, marker: &str) -> bool {
    headers
        .get(INTERNAL_AUTH_HEADER)
        .is_some_and(|value| value.as_bytes() == marker.as_bytes())
}

/// Middleware rejecting direct access with 403 before any resource logic runs.
pub async fn require_gateway(
    State(marker): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    if is_from_gateway(request.headers(), &marker) {
        next.run(request).await
    } else {
        warn!(path = %request.uri().path(), "direct access attempt rejected");
        ApiError::Forbidden.into_response()
    }
}
