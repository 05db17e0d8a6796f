use crate::{
    auth::state::AuthState,
    envelope::Envelope,
    error::ApiError,
    tokens::{fingerprint, TokenError},
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[derive(Serialize, Debug)]
struct Validation<'a> {
    username: &'a str,
    #[serde(rename = "usos_restantes")]
    uses_left: u32,
    message: &'a str,
}

#[utoipa::path(
    get,
    path= "/api/v1/validate",
    responses (
        (status = 200, description = "Token valid, one use spent", body = Envelope, content_type = "application/json"),
        (status = 401, description = "Missing, invalid, expired or exhausted token", body = Envelope),
        (status = 500, description = "Signing secret not configured", body = Envelope),
    ),
    tag= "auth"
)]
#[instrument(skip(state, headers))]
pub async fn validate(state: Extension<Arc<AuthState>>, headers: HeaderMap) -> Response {
    let Some(token) = state.cookie().extract(&headers) else {
        return ApiError::Unauthenticated("session cookie not found".to_string()).into_response();
    };

    match state.tokens().validate_and_consume(&token) {
        Ok(consumption) => {
            let message = if consumption.exhausted() {
                "token has reached its maximum number of uses"
            } else {
                "token valid"
            };

            let data = Validation {
                username: &consumption.subject,
                uses_left: consumption.uses_left,
                message,
            };

            let headers = if consumption.exhausted() {
                debug!(token = %fingerprint(&token), "token exhausted, clearing cookie");
                clear_cookie(&state)
            } else {
                HeaderMap::new()
            };

            let envelope = Envelope::success("token valid", serde_json::to_value(&data).ok());
            (headers, envelope.with_status(StatusCode::OK)).into_response()
        }
        Err(err @ TokenError::MissingSecret) => {
            error!("Cannot validate token: {}", err);
            ApiError::from(err).into_response()
        }
        Err(err) => {
            if matches!(err, TokenError::Expired) {
                state.tokens().revoke(&token);
            }
            debug!(token = %fingerprint(&token), "token rejected: {}", err);
            (clear_cookie(&state), ApiError::from(err)).into_response()
        }
    }
}

fn clear_cookie(state: &AuthState) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match state.cookie().cleared() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Error building cleared cookie: {}", err),
    }
    headers
}
