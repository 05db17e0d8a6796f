//! Gateway orchestrator: the only client facing entry point for data.
//!
//! Every request is validated against the credential service first and only
//! forwarded to the backend when that succeeds.

pub mod client;
pub mod handlers;

use crate::{
    cookie::CookieConfig,
    envelope::{Envelope, Status},
    server::{self, Service},
    API_PREFIX,
};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use client::GatewayClient;
use std::{sync::Arc, time::Duration};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::collection, handlers::item, crate::health::health),
    components(schemas(Envelope, Status, crate::health::Health)),
    tags((name = "gateway", description = "Authenticated access to the data collections"))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(Debug, Clone)]
pub struct GatewayState {
    client: GatewayClient,
    cookie: CookieConfig,
    timeout: Duration,
}

impl GatewayState {
    #[must_use]
    pub fn new(client: GatewayClient, cookie: CookieConfig) -> Self {
        Self {
            client,
            cookie,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    #[must_use]
    pub fn cookie(&self) -> &CookieConfig {
        &self.cookie
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[must_use]
pub fn router(state: Arc<GatewayState>) -> Router {
    let api = Router::new()
        .route("/:resource", get(handlers::collection))
        .route("/:resource/:id", get(handlers::item));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(Extension(state))
}

#[must_use]
pub fn app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);

    server::app(router(state), Service::Gateway, openapi(), cors)
}
