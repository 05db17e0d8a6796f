use super::Credentials;
use crate::{
    auth::{password::hash_password, state::AuthState, storage::CreateOutcome},
    envelope::Envelope,
    error::ApiError,
};
use axum::{extract::Extension, http::StatusCode, response::Response, Json};
use serde_json::json;
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, instrument};

#[utoipa::path(
    post,
    path= "/api/v1/register",
    request_body = Credentials,
    responses (
        (status = 201, description = "User registered", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Missing or malformed credentials", body = Envelope),
        (status = 409, description = "Username already taken", body = Envelope),
    ),
    tag= "auth"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<Credentials>>,
) -> Result<Response, ApiError> {
    let Credentials { username, password } = Credentials::require(payload)?;

    let hash = task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| {
            error!("Password hashing task failed: {}", err);
            ApiError::Internal("error registering user".to_string())
        })?
        .map_err(|err| {
            error!("Error hashing password: {:?}", err);
            ApiError::Internal("error registering user".to_string())
        })?;

    match state.users().create_user(&username, &hash).await {
        Ok(CreateOutcome::Created) => {
            info!(username = %username, "user registered");
            Ok(Envelope::success(
                "user registered successfully",
                Some(json!({ "username": username })),
            )
            .with_status(StatusCode::CREATED))
        }
        Ok(CreateOutcome::Duplicate) => {
            Err(ApiError::Conflict("username already exists".to_string()))
        }
        Err(err) => {
            error!("Error inserting user: {:?}", err);
            Err(ApiError::Internal("error registering user".to_string()))
        }
    }
}
