//! Backend data service. Serves the collections, but only to the gateway.

pub mod guard;
pub mod handlers;
pub mod source;

use crate::{
    envelope::{Envelope, Status},
    server::{self, Service},
    API_PREFIX,
};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware,
    routing::get,
    Router,
};
use source::DataSource;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::collection, handlers::item, crate::health::health),
    components(schemas(Envelope, Status, crate::health::Health)),
    tags((name = "backend", description = "Data collections, reachable through the gateway only"))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Data routes behind the provenance guard.
#[must_use]
pub fn router(source: Arc<DataSource>, marker: &str) -> Router {
    let api = Router::new()
        .route("/:resource", get(handlers::collection))
        .route("/:resource/:id", get(handlers::item))
        .fallback(handlers::unmatched)
        .layer(middleware::from_fn_with_state(
            Arc::<str>::from(marker),
            guard::require_gateway,
        ));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(Extension(source))
}

#[must_use]
pub fn app(source: Arc<DataSource>, marker: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(guard::INTERNAL_AUTH_HEADER),
        ])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);

    server::app(router(source, marker), Service::Backend, openapi(), cors)
}
