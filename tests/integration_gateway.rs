use anyhow::{Context, Result};
use reqwest::{header::SET_COOKIE, StatusCode};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use turnstile::{
    auth::{self, state::AuthState, storage::UserStore},
    backend::{self, guard::DEFAULT_INTERNAL_MARKER, source::DataSource},
    cookie::CookieConfig,
    gateway::{self, client::GatewayClient, GatewayState},
    server::{self, Service},
    tokens::TokenManager,
};
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

struct Stack {
    auth: SocketAddr,
    gateway: SocketAddr,
    backend: SocketAddr,
    http: reqwest::Client,
    _data: MockServer,
}

async fn spawn(app: axum::Router, service: Service) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(server::serve(listener, app, service));
    Ok(addr)
}

fn base(addr: SocketAddr) -> Result<Url> {
    Ok(Url::parse(&format!("http://{addr}"))?)
}

impl Stack {
    async fn start(data: MockServer) -> Result<Self> {
        let tokens = Arc::new(TokenManager::new(Some(&SecretString::from(
            "integration-secret".to_string(),
        ))));
        let users = UserStore::connect("sqlite::memory:").await?;
        let cookie = CookieConfig::new("auth_token".to_string());
        let auth_addr = spawn(
            auth::app(Arc::new(AuthState::new(tokens, users, cookie.clone()))),
            Service::Auth,
        )
        .await?;

        let source = DataSource::new(Url::parse(&data.uri())?, Duration::from_secs(5))?;
        let backend_addr = spawn(
            backend::app(Arc::new(source), DEFAULT_INTERNAL_MARKER),
            Service::Backend,
        )
        .await?;

        let client = GatewayClient::new(
            base(auth_addr)?,
            base(backend_addr)?,
            DEFAULT_INTERNAL_MARKER,
        )?;
        let state = GatewayState::new(client, cookie).with_timeout(Duration::from_secs(5));
        let gateway_addr = spawn(gateway::app(Arc::new(state)), Service::Gateway).await?;

        Ok(Self {
            auth: auth_addr,
            gateway: gateway_addr,
            backend: backend_addr,
            http: reqwest::Client::new(),
            _data: data,
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let credentials = json!({"username": username, "password": password});

        let response = self
            .http
            .post(format!("http://{}/api/v1/register", self.auth))
            .json(&credentials)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self
            .http
            .post(format!("http://{}/api/v1/login", self.auth))
            .json(&credentials)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
            .context("login did not set the session cookie")?;
        Ok(cookie)
    }

    async fn through_gateway(&self, uri: &str, cookie: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.http.get(format!("http://{}{uri}", self.gateway));
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        Ok(request.send().await?)
    }
}

fn clears_cookie(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("Max-Age=0"))
}

#[tokio::test]
async fn token_allows_exactly_five_proxied_requests() -> Result<()> {
    let data = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Rick Sanchez"})),
        )
        .expect(5)
        .mount(&data)
        .await;

    let stack = Stack::start(data).await?;
    let cookie = stack.login("rick", "pickle").await?;

    for attempt in 1..=5 {
        let response = stack
            .through_gateway("/api/v1/character/1", Some(&cookie))
            .await?;
        assert_eq!(response.status(), StatusCode::OK, "attempt {attempt}");
        assert_eq!(clears_cookie(&response), attempt == 5, "attempt {attempt}");

        let body: Value = response.json().await?;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["name"], "Rick Sanchez");
    }

    let response = stack
        .through_gateway("/api/v1/character/1", Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "token expired or exhausted");
    Ok(())
}

#[tokio::test]
async fn direct_validation_counts_down_to_zero() -> Result<()> {
    let stack = Stack::start(MockServer::start().await).await?;
    let cookie = stack.login("morty", "aw-geez").await?;

    for expected in [4, 3, 2, 1, 0] {
        let response = stack
            .http
            .get(format!("http://{}/api/v1/validate", stack.auth))
            .header("cookie", &cookie)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(clears_cookie(&response), expected == 0);

        let body: Value = response.json().await?;
        assert_eq!(body["data"]["usos_restantes"], expected);
    }

    let response = stack
        .http
        .get(format!("http://{}/api/v1/validate", stack.auth))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn requests_without_session_never_reach_the_data_source() -> Result<()> {
    let data = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&data)
        .await;

    let stack = Stack::start(data).await?;

    let response = stack.through_gateway("/api/v1/character/1", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = stack
        .through_gateway("/api/v1/character/1", Some("auth_token=forged"))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_cookie(&response));

    let response = stack
        .http
        .get(format!("http://{}/api/v1/character/1", stack.backend))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn every_service_reports_health() -> Result<()> {
    let stack = Stack::start(MockServer::start().await).await?;

    for (addr, service) in [
        (stack.auth, "auth"),
        (stack.gateway, "gateway"),
        (stack.backend, "backend"),
    ] {
        let response = stack.http.get(format!("http://{addr}/health")).send().await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-app").is_some());
        assert!(response.headers().get("x-request-id").is_some());

        let body: Value = response.json().await?;
        assert_eq!(body["service"], service);
    }
    Ok(())
}
