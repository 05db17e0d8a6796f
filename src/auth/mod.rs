//! Credential service: registration, login and counted token validation.

pub mod handlers;
pub mod password;
pub mod state;
pub mod storage;

use crate::{
    envelope::{Envelope, Status},
    server::{self, Service},
    API_PREFIX,
};
use axum::{
    extract::Extension,
    http::Method,
    routing::{get, post},
    Router,
};
use handlers::{login, register, validate, Credentials};
use state::AuthState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        register::register,
        login::login,
        validate::validate,
        crate::health::health
    ),
    components(schemas(Credentials, Envelope, Status, crate::health::Health)),
    tags((name = "auth", description = "Credential service"))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Routes under the API prefix.
#[must_use]
pub fn router(state: Arc<AuthState>) -> Router {
    let api = Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/validate", get(validate::validate));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(Extension(state))
}

/// The complete credential service, ready to serve.
#[must_use]
pub fn app(state: Arc<AuthState>) -> Router {
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);

    let users = state.users().clone();

    server::app(router(state), Service::Auth, openapi(), cors).layer(Extension(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::storage::UserStore, cookie::CookieConfig, tokens::TokenManager};
    use anyhow::{Context, Result};
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
            Request, StatusCode,
        },
        response::Response,
    };
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app(secret: Option<&str>, max_uses: u32) -> Result<Router> {
        let secret = secret.map(|s| SecretString::from(s.to_string()));
        let tokens = Arc::new(TokenManager::new(secret.as_ref()).with_max_uses(max_uses));
        let users = UserStore::connect("sqlite::memory:").await?;
        let cookie = CookieConfig::new("auth_token".to_string());
        Ok(app(Arc::new(AuthState::new(tokens, users, cookie))))
    }

    fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))?)
    }

    fn validate_request(cookie: Option<&str>) -> Result<Request<Body>> {
        let mut builder = Request::builder().uri("/api/v1/validate");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        Ok(builder.body(Body::empty())?)
    }

    async fn json_body(response: Response) -> Result<Value> {
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn set_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    async fn register_and_login(app: &Router) -> Result<String> {
        let credentials = json!({"username": "rick", "password": "pickle"});

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/register", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/login", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = set_cookie(&response).context("login did not set a cookie")?;
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));

        let body = json_body(response).await?;
        assert_eq!(body["data"]["usos_restantes"], 5);
        assert_eq!(body["data"]["username"], "rick");

        // keep only `name=value`
        cookie
            .split(';')
            .next()
            .map(str::to_string)
            .context("malformed cookie")
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_bad_bodies() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        let credentials = json!({"username": "morty", "password": "aw-geez"});

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/register", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/register", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await?["status"], "error");

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/register", &json!({"username": "x"}))?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json(
                "/api/v1/register",
                &json!({"username": "", "password": "x"}),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn login_failures_share_one_message() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        app.clone()
            .oneshot(post_json(
                "/api/v1/register",
                &json!({"username": "beth", "password": "horses"}),
            )?)
            .await?;

        let wrong_password = app
            .clone()
            .oneshot(post_json(
                "/api/v1/login",
                &json!({"username": "beth", "password": "nope"}),
            )?)
            .await?;
        let unknown_user = app
            .oneshot(post_json(
                "/api/v1/login",
                &json!({"username": "jerry", "password": "horses"}),
            )?)
            .await?;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&wrong_password).is_none());
        assert_eq!(
            json_body(wrong_password).await?["message"],
            json_body(unknown_user).await?["message"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn validate_counts_down_and_clears_the_cookie() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        let cookie = register_and_login(&app).await?;

        for expected in [4, 3, 2, 1] {
            let response = app
                .clone()
                .oneshot(validate_request(Some(&cookie))?)
                .await?;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(set_cookie(&response).is_none());

            let body = json_body(response).await?;
            assert_eq!(body["status"], "success");
            assert_eq!(body["data"]["usos_restantes"], expected);
            assert_eq!(body["data"]["username"], "rick");
        }

        let last = app
            .clone()
            .oneshot(validate_request(Some(&cookie))?)
            .await?;
        assert_eq!(last.status(), StatusCode::OK);
        assert!(set_cookie(&last).is_some_and(|c| c.contains("Max-Age=0")));
        assert_eq!(json_body(last).await?["data"]["usos_restantes"], 0);

        let after = app.oneshot(validate_request(Some(&cookie))?).await?;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&after).is_some_and(|c| c.contains("Max-Age=0")));
        assert_eq!(json_body(after).await?["status"], "error");
        Ok(())
    }

    #[tokio::test]
    async fn validate_without_cookie_is_unauthenticated() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        let response = app.oneshot(validate_request(None)?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&response).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn validate_rejects_forged_tokens() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        let response = app
            .oneshot(validate_request(Some("auth_token=not.a.jwt"))?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&response).is_some_and(|c| c.contains("Max-Age=0")));
        Ok(())
    }

    #[tokio::test]
    async fn missing_secret_fails_login_with_internal_error() -> Result<()> {
        let app = test_app(None, 5).await?;
        let credentials = json!({"username": "rick", "password": "pickle"});
        app.clone()
            .oneshot(post_json("/api/v1/register", &credentials)?)
            .await?;

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/login", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await?["message"],
            "signing secret not configured"
        );

        let response = app
            .oneshot(validate_request(Some("auth_token=anything"))?)
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn health_includes_database_status() -> Result<()> {
        let app = test_app(Some("secret"), 5).await?;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["service"], "auth");
        assert_eq!(body["database"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_forgotten() -> Result<()> {
        let secret = SecretString::from("secret".to_string());
        let tokens = Arc::new(TokenManager::new(Some(&secret)).with_ttl_seconds(1));
        let users = UserStore::connect("sqlite::memory:").await?;
        let cookie = CookieConfig::new("auth_token".to_string());
        let app = app(Arc::new(AuthState::new(Arc::clone(&tokens), users, cookie)));

        let credentials = json!({"username": "birdperson", "password": "tammy"});
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/register", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/login", &credentials)?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let session = set_cookie(&response)
            .and_then(|cookie| cookie.split(';').next().map(str::to_string))
            .context("login did not set a cookie")?;
        assert_eq!(tokens.live_tokens(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        let response = app.oneshot(validate_request(Some(&session))?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cleared = set_cookie(&response).context("expired token kept its cookie")?;
        assert!(cleared.contains("Max-Age=0"));
        assert_eq!(json_body(response).await?["message"], "token expired");
        assert_eq!(tokens.live_tokens(), 0);
        Ok(())
    }
}
