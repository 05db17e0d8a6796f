//! The `{status, message, data}` wrapper shared by every service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[must_use]
pub fn build_envelope(status: Status, message: impl Into<String>, data: Option<Value>) -> Envelope {
    Envelope {
        status,
        message: message.into(),
        data,
    }
}

impl Envelope {
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        build_envelope(Status::Success, message, data)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        build_envelope(Status::Error, message, None)
    }

    /// Parse a downstream body, if it is an envelope at all.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Pair the envelope with an HTTP status code.
    pub fn with_status(self, code: StatusCode) -> Response {
        (code, Json(self)).into_response()
    }
}
