//! Outbound calls to the credential service and the backend data service.

use crate::{
    backend::guard::INTERNAL_AUTH_HEADER,
    error::{ApiError, Upstream},
    resource::ResourceKind,
    API_PREFIX, APP_USER_AGENT,
};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue, StatusCode,
    },
};
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error};
use url::Url;

// Fallback for budgets whose deadline does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Time left for one inbound request, shared by every call it makes.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Instant,
}

impl Budget {
    #[must_use]
    pub fn start(total: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(total)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { deadline }
    }

    /// `None` once the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }
}

/// A downstream answer, fully read.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub set_cookies: Vec<HeaderValue>,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    auth_url: Url,
    backend_url: Url,
    marker: HeaderValue,
}

impl GatewayClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the marker is not
    /// a valid header value.
    pub fn new(auth_url: Url, backend_url: Url, marker: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        let marker = HeaderValue::from_str(marker).context("invalid internal marker")?;

        Ok(Self {
            http,
            auth_url,
            backend_url,
            marker,
        })
    }

    /// Ask the credential service whether the session cookie is still good.
    ///
    /// # Errors
    /// Returns `ApiError::UpstreamUnavailable` if the service cannot be reached
    /// within the budget.
    pub async fn validate(&self, cookies: &HeaderValue, budget: Budget) -> Result<Reply, ApiError> {
        let url = endpoint(&self.auth_url, &format!("{API_PREFIX}/validate"));
        debug!("validating session against {}", url);

        let request = self.http.get(url).header(COOKIE, cookies.clone());
        send(request, budget, Upstream::CredentialService).await
    }

    /// Forward the data request to the backend, tagged with the provenance header.
    ///
    /// # Errors
    /// Returns `ApiError::UpstreamUnavailable` if the backend cannot be reached
    /// within the budget.
    pub async fn fetch(
        &self,
        resource: ResourceKind,
        id: Option<&str>,
        query: &[(String, String)],
        cookies: &HeaderValue,
        budget: Budget,
    ) -> Result<Reply, ApiError> {
        let path = match id {
            Some(id) => format!("{API_PREFIX}/{resource}/{id}"),
            None => format!("{API_PREFIX}/{resource}"),
        };
        let mut url = endpoint(&self.backend_url, &path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!("proxying to {}", url);

        let request = self
            .http
            .get(url)
            .header(COOKIE, cookies.clone())
            .header(INTERNAL_AUTH_HEADER, self.marker.clone());
        send(request, budget, Upstream::BackendDataService).await
    }
}

/// Append `path` to the base URL's own path.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{path}", base.path().trim_end_matches('/'));
    url.set_path(&joined);
    url.set_query(None);
    url
}

async fn send(
    request: reqwest::RequestBuilder,
    budget: Budget,
    upstream: Upstream,
) -> Result<Reply, ApiError> {
    let Some(timeout) = budget.remaining() else {
        error!("request budget exhausted before calling {}", upstream);
        return Err(ApiError::UpstreamUnavailable(upstream));
    };

    let unavailable = |err: reqwest::Error| {
        if err.is_timeout() {
            error!("timed out calling {}: {}", upstream, err);
        } else {
            error!("error calling {}: {}", upstream, err);
        }
        ApiError::UpstreamUnavailable(upstream)
    };

    let response = request.timeout(timeout).send().await.map_err(unavailable)?;

    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .cloned()
        .collect();
    let body = response.bytes().await.map_err(unavailable)?;

    Ok(Reply {
        status,
        set_cookies,
        body,
    })
}
