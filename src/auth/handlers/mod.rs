pub mod login;
pub mod register;
pub mod validate;

use crate::error::ApiError;
use axum::Json;
use serde::Deserialize;
use std::fmt;
use utoipa::ToSchema;

/// Body of `register` and `login`.
#[derive(ToSchema, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Unwrap an optional JSON body into non empty credentials.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidInput` for a missing or malformed body, or
    /// when either field is empty.
    pub fn require(payload: Option<Json<Self>>) -> Result<Self, ApiError> {
        let Some(Json(mut credentials)) = payload else {
            return Err(ApiError::InvalidInput("invalid request body".to_string()));
        };

        credentials.username = credentials.username.trim().to_string();

        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(ApiError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        Ok(credentials)
    }
}
