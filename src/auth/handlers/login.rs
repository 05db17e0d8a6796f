use super::Credentials;
use crate::{
    auth::{password::verify_password, state::AuthState},
    envelope::Envelope,
    error::ApiError,
    tokens::fingerprint,
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info, instrument};

const INVALID_CREDENTIALS: &str = "invalid credentials";

#[utoipa::path(
    post,
    path= "/api/v1/login",
    request_body = Credentials,
    responses (
        (status = 200, description = "Login successful, session cookie set", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Missing or malformed credentials", body = Envelope),
        (status = 401, description = "Unknown user or wrong password", body = Envelope),
        (status = 500, description = "Token could not be issued", body = Envelope),
    ),
    tag= "auth"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<Credentials>>,
) -> Result<Response, ApiError> {
    let Credentials { username, password } = Credentials::require(payload)?;

    let user = state.users().find_user(&username).await.map_err(|err| {
        error!("Error looking up user: {:?}", err);
        ApiError::Internal("error processing login".to_string())
    })?;

    let Some(user) = user else {
        debug!(username = %username, "unknown user");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    };

    let stored = user.password_hash;
    let valid = task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|err| {
            error!("Password verification task failed: {}", err);
            ApiError::Internal("error processing login".to_string())
        })?;

    if !valid {
        debug!(username = %username, "wrong password");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }

    let issued = state.tokens().issue(&user.username).map_err(|err| {
        error!("Error issuing token: {}", err);
        ApiError::from(err)
    })?;

    let cookie = state
        .cookie()
        .session(&issued.token, state.tokens().ttl_seconds())
        .map_err(|err| {
            error!("Error building session cookie: {}", err);
            ApiError::Internal("error processing login".to_string())
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    info!(
        username = %issued.subject,
        token = %fingerprint(&issued.token),
        "login successful"
    );

    let data = json!({
        "username": issued.subject,
        "usos_restantes": issued.remaining_uses,
    });

    Ok((
        headers,
        Envelope::success("login successful", Some(data)).with_status(StatusCode::OK),
    )
        .into_response())
}
