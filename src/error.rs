//! Error taxonomy shared by the three services.

use crate::envelope::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

/// Downstream collaborators the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    CredentialService,
    BackendDataService,
    PublicDataSource,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CredentialService => "credential service",
            Self::BackendDataService => "backend data service",
            Self::PublicDataSource => "public data source",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("token expired or exhausted")]
    TokenExhausted,
    #[error("{0}")]
    Conflict(String),
    #[error("invalid endpoint, use: character, location or episode")]
    InvalidEndpoint,
    #[error("direct access not allowed, use the gateway")]
    Forbidden,
    #[error("error connecting to {0}")]
    UpstreamUnavailable(Upstream),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidEndpoint => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) | Self::Unauthorized(_) | Self::TokenExhausted => {
                StatusCode::UNAUTHORIZED
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        Envelope::error(self.to_string()).with_status(code)
    }
}
