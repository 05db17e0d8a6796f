use super::startup::log_entries;
use crate::{
    cookie::CookieConfig,
    gateway::{self, client::GatewayClient, GatewayState},
    server::{self, Service},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub auth_url: Url,
    pub backend_url: Url,
    pub cookie_name: String,
    pub timeout: Duration,
    pub internal_marker: String,
}

/// Execute the gateway action.
/// # Errors
/// Returns an error if the HTTP client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let client = GatewayClient::new(args.auth_url, args.backend_url, &args.internal_marker)?;
    let state = GatewayState::new(client, CookieConfig::new(args.cookie_name))
        .with_timeout(args.timeout);

    let listener = server::bind(args.port).await?;
    server::serve(listener, gateway::app(Arc::new(state)), Service::Gateway).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("auth_url", args.auth_url.to_string()),
        ("backend_url", args.backend_url.to_string()),
        ("cookie_name", args.cookie_name.clone()),
        ("timeout", format!("{}s", args.timeout.as_secs())),
        (
            "internal_marker_set",
            (!args.internal_marker.is_empty()).to_string(),
        ),
    ];
    log_entries(Service::Gateway, &entries);
}
