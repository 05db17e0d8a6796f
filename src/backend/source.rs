//! Client for the public data source.

use crate::{
    error::{ApiError, Upstream},
    gateway::client::endpoint,
    resource::ResourceKind,
    APP_USER_AGENT,
};
use anyhow::{Context, Result};
use axum::http::StatusCode;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_DATA_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug)]
pub enum Fetched {
    Data(Value),
    Failed(StatusCode),
}

#[derive(Debug, Clone)]
pub struct DataSource {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl DataSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `<base>/<resource>[/<id>]`, forwarding `query`.
    ///
    /// # Errors
    /// - `ApiError::UpstreamUnavailable` if the source cannot be reached
    /// - `ApiError::Internal` if a successful answer is not JSON
    pub async fn fetch(
        &self,
        resource: ResourceKind,
        id: Option<&str>,
        query: &[(String, String)],
    ) -> Result<Fetched, ApiError> {
        let path = match id {
            Some(id) => format!("/{resource}/{id}"),
            None => format!("/{resource}"),
        };
        let mut url = endpoint(&self.base_url, &path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!("fetching {}", url);

        let response = self.http.get(url).send().await.map_err(|err| {
            error!("Error calling public data source: {}", err);
            ApiError::UpstreamUnavailable(Upstream::PublicDataSource)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "public data source answered with an error");
            return Ok(Fetched::Failed(status));
        }

        let body = response.bytes().await.map_err(|err| {
            error!("Error reading public data source response: {}", err);
            ApiError::UpstreamUnavailable(Upstream::PublicDataSource)
        })?;

        serde_json::from_slice(&body).map(Fetched::Data).map_err(|err| {
            error!("Error decoding public data source response: {}", err);
            ApiError::Internal("error processing data source response".to_string())
        })
    }
}
