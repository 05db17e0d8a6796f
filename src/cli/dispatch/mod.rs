use crate::cli::actions::{auth, backend, gateway, Action};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("auth", sub)) => auth_args(sub).map(Action::Auth),
        Some(("gateway", sub)) => gateway_args(sub).map(Action::Gateway),
        Some(("backend", sub)) => backend_args(sub).map(Action::Backend),
        _ => Err(anyhow!("missing subcommand: auth, gateway or backend")),
    }
}

fn auth_args(matches: &ArgMatches) -> Result<auth::Args> {
    Ok(auth::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8081),
        dsn: required::<String>(matches, "dsn")?,
        jwt_secret: matches
            .get_one::<String>("jwt-secret")
            .filter(|secret| !secret.is_empty())
            .map(|secret| SecretString::from(secret.clone())),
        cookie_name: required::<String>(matches, "cookie-name")?,
        cookie_secure: matches.get_flag("cookie-secure"),
        max_uses: required::<u32>(matches, "max-uses")?,
        token_ttl: required::<i64>(matches, "token-ttl")?,
        sweep_interval: Duration::from_secs(required::<u64>(matches, "sweep-interval")?),
    })
}

fn gateway_args(matches: &ArgMatches) -> Result<gateway::Args> {
    Ok(gateway::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        auth_url: required::<Url>(matches, "auth-url")?,
        backend_url: required::<Url>(matches, "backend-url")?,
        cookie_name: required::<String>(matches, "cookie-name")?,
        timeout: Duration::from_secs(required::<u64>(matches, "timeout")?),
        internal_marker: required::<String>(matches, "internal-marker")?,
    })
}

fn backend_args(matches: &ArgMatches) -> Result<backend::Args> {
    Ok(backend::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8082),
        data_url: required::<Url>(matches, "data-url")?,
        timeout: Duration::from_secs(required::<u64>(matches, "timeout")?),
        internal_marker: required::<String>(matches, "internal-marker")?,
    })
}

fn required<T>(matches: &ArgMatches, id: &str) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}
