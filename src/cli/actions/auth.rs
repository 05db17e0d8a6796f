use super::startup::{log_entries, redact_dsn};
use crate::{
    auth::{self, state::AuthState, storage::UserStore},
    cookie::CookieConfig,
    server::{self, Service},
    tokens::{spawn_sweeper, TokenManager},
};
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: Option<SecretString>,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub max_uses: u32,
    pub token_ttl: i64,
    pub sweep_interval: Duration,
}

/// Execute the auth action.
/// # Errors
/// Returns an error if the user store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    if args.jwt_secret.is_none() {
        warn!("TURNSTILE_JWT_SECRET is not set, login and validate requests will fail");
    }

    let users = UserStore::connect(&args.dsn).await?;

    let tokens = Arc::new(
        TokenManager::new(args.jwt_secret.as_ref())
            .with_max_uses(args.max_uses)
            .with_ttl_seconds(args.token_ttl),
    );

    let sweeper = if args.sweep_interval.is_zero() {
        info!("Expired token sweep disabled");
        None
    } else {
        Some(spawn_sweeper(Arc::clone(&tokens), args.sweep_interval))
    };

    let cookie = CookieConfig::new(args.cookie_name).with_secure(args.cookie_secure);
    let app = auth::app(Arc::new(AuthState::new(tokens, users, cookie)));

    let listener = server::bind(args.port).await?;
    let result = server::serve(listener, app, Service::Auth).await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("jwt_secret_set", args.jwt_secret.is_some().to_string()),
        ("cookie_name", args.cookie_name.clone()),
        ("cookie_secure", args.cookie_secure.to_string()),
        ("max_uses", args.max_uses.to_string()),
        ("token_ttl", format!("{}s", args.token_ttl)),
        ("sweep_interval", format!("{}s", args.sweep_interval.as_secs())),
    ];
    log_entries(Service::Auth, &entries);
}
