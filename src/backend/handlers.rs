use super::source::{DataSource, Fetched};
use crate::{
    envelope::Envelope,
    error::ApiError,
    resource::{normalize_resource, resolve_id},
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    get,
    path= "/api/v1/{resource}",
    params(
        ("resource" = String, Path, description = "character, location or episode (plural accepted)"),
        ("X-Internal-Auth" = String, Header, description = "Provenance marker set by the gateway"),
    ),
    responses (
        (status = 200, description = "Collection data", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Unknown resource or bad identifier", body = Envelope),
        (status = 403, description = "Request did not come through the gateway", body = Envelope),
        (status = 502, description = "Public data source unreachable", body = Envelope),
    ),
    tag= "backend"
)]
#[instrument(skip(source, query))]
pub async fn collection(
    source: Extension<Arc<DataSource>>,
    Path(resource): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    serve(&source, &resource, None, query)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path= "/api/v1/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "character, location or episode (plural accepted)"),
        ("id" = String, Path, description = "Numeric identifier, or a comma separated list"),
        ("X-Internal-Auth" = String, Header, description = "Provenance marker set by the gateway"),
    ),
    responses (
        (status = 200, description = "Item data", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Unknown resource or bad identifier", body = Envelope),
        (status = 403, description = "Request did not come through the gateway", body = Envelope),
        (status = 502, description = "Public data source unreachable", body = Envelope),
    ),
    tag= "backend"
)]
#[instrument(skip(source, query))]
pub async fn item(
    source: Extension<Arc<DataSource>>,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    serve(&source, &resource, Some(&id), query)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Guarded requests whose path matches no collection route.
pub async fn unmatched() -> ApiError {
    ApiError::InvalidEndpoint
}

async fn serve(
    source: &DataSource,
    resource: &str,
    path_id: Option<&str>,
    query: Vec<(String, String)>,
) -> Result<Response, ApiError> {
    let resource = normalize_resource(resource)?;

    let (query_id, query): (Vec<_>, Vec<_>) = query.into_iter().partition(|(key, _)| key == "id");
    let query_id = query_id.into_iter().next().map(|(_, value)| value);
    let id = resolve_id(path_id, query_id.as_deref())?;

    match source.fetch(resource, id.as_deref(), &query).await? {
        Fetched::Data(data) => {
            Ok(Envelope::success("data retrieved successfully", Some(data))
                .with_status(StatusCode::OK))
        }
        Fetched::Failed(status) => {
            Ok(Envelope::error("error from public data source").with_status(status))
        }
    }
}
