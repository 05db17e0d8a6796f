use super::{client::Budget, client::Reply, GatewayState};
use crate::{
    envelope::{Envelope, Status},
    error::ApiError,
    resource::{normalize_resource, resolve_id},
};
use axum::{
    extract::{Extension, Path, Query},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// What the gateway knows about one inbound data request.
#[derive(Debug, Default)]
pub struct ProxyRequest {
    pub resource: String,
    pub path_id: Option<String>,
    pub query: Vec<(String, String)>,
}

#[utoipa::path(
    get,
    path= "/api/v1/{resource}",
    params(
        ("resource" = String, Path, description = "character, location or episode (plural accepted)"),
    ),
    responses (
        (status = 200, description = "Collection data", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Unknown resource or bad identifier", body = Envelope),
        (status = 401, description = "Missing, invalid or exhausted session", body = Envelope),
        (status = 502, description = "A downstream service is unreachable", body = Envelope),
    ),
    tag= "gateway"
)]
#[instrument(skip(state, headers, query))]
pub async fn collection(
    state: Extension<Arc<GatewayState>>,
    Path(resource): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request = ProxyRequest {
        resource,
        path_id: None,
        query,
    };
    respond(proxy(&state, &headers, request).await)
}

#[utoipa::path(
    get,
    path= "/api/v1/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "character, location or episode (plural accepted)"),
        ("id" = String, Path, description = "Numeric identifier, or a comma separated list"),
    ),
    responses (
        (status = 200, description = "Item data", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Unknown resource or bad identifier", body = Envelope),
        (status = 401, description = "Missing, invalid or exhausted session", body = Envelope),
        (status = 502, description = "A downstream service is unreachable", body = Envelope),
    ),
    tag= "gateway"
)]
#[instrument(skip(state, headers, query))]
pub async fn item(
    state: Extension<Arc<GatewayState>>,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request = ProxyRequest {
        resource,
        path_id: Some(id),
        query,
    };
    respond(proxy(&state, &headers, request).await)
}

fn respond(result: Result<Response, ApiError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

/// Validate the session, then forward the request to the backend.
///
/// Local checks (cookie present, resource known, identifier numeric) run
/// before any network call. Validation and proxying share one time budget.
///
/// # Errors
/// Returns the `ApiError` raised by whichever step failed first.
pub async fn proxy(
    state: &GatewayState,
    headers: &HeaderMap,
    request: ProxyRequest,
) -> Result<Response, ApiError> {
    if state.cookie().extract(headers).is_none() {
        return Err(ApiError::Unauthenticated(
            "authentication required".to_string(),
        ));
    }
    let cookies = forwarded_cookies(headers)?;

    let resource = normalize_resource(&request.resource)?;

    let (query_id, query): (Vec<_>, Vec<_>) =
        request.query.into_iter().partition(|(key, _)| key == "id");
    let query_id = query_id.into_iter().next().map(|(_, value)| value);
    let id = resolve_id(request.path_id.as_deref(), query_id.as_deref())?;

    let budget = Budget::start(state.timeout());

    let verdict = state.client().validate(&cookies, budget).await?;
    if !verdict.status.is_success() {
        debug!(status = %verdict.status, "session rejected by credential service");
        return Ok(relay(&verdict, "authentication error"));
    }

    let reply = state
        .client()
        .fetch(resource, id.as_deref(), &query, &cookies, budget)
        .await?;
    if !reply.status.is_success() {
        debug!(status = %reply.status, "backend answered with an error");
        let mut response = relay(&reply, "error from backend data service");
        append_cookies(response.headers_mut(), &verdict.set_cookies);
        return Ok(response);
    }

    let data = unwrap_data(&reply.body).map_err(|err| {
        error!("Error decoding backend response: {}", err);
        ApiError::Internal("error processing backend response".to_string())
    })?;

    let mut response =
        Envelope::success("data retrieved successfully", Some(data)).with_status(StatusCode::OK);
    append_cookies(response.headers_mut(), &verdict.set_cookies);
    Ok(response)
}

/// Every `Cookie` header of the inbound request, joined into one value.
fn forwarded_cookies(headers: &HeaderMap) -> Result<HeaderValue, ApiError> {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&joined)
        .map_err(|_| ApiError::InvalidInput("invalid cookie header".to_string()))
}

/// Pass a downstream error through: its envelope when it has one, otherwise a
/// generic message. The status code is kept either way.
fn relay(reply: &Reply, fallback: &str) -> Response {
    let envelope = Envelope::parse(&reply.body)
        .filter(|envelope| envelope.status == Status::Error)
        .unwrap_or_else(|| Envelope::error(fallback));
    let mut response = envelope.with_status(reply.status);
    append_cookies(response.headers_mut(), &reply.set_cookies);
    response
}

fn append_cookies(headers: &mut HeaderMap, cookies: &[HeaderValue]) {
    for cookie in cookies {
        headers.append(SET_COOKIE, cookie.clone());
    }
}

/// The backend already wraps its payload; keep only the inner data so the
/// client never sees an envelope inside an envelope.
fn unwrap_data(body: &[u8]) -> Result<Value, serde_json::Error> {
    if let Some(envelope) = Envelope::parse(body) {
        return Ok(envelope.data.unwrap_or(Value::Null));
    }
    serde_json::from_slice(body)
}
