use super::startup::log_entries;
use crate::{
    backend::{self, source::DataSource},
    server::{self, Service},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub data_url: Url,
    pub timeout: Duration,
    pub internal_marker: String,
}

/// Execute the backend action.
/// # Errors
/// Returns an error if the HTTP client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let source = DataSource::new(args.data_url, args.timeout)?;
    let app = backend::app(Arc::new(source), &args.internal_marker);

    let listener = server::bind(args.port).await?;
    server::serve(listener, app, Service::Backend).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("data_url", args.data_url.to_string()),
        ("timeout", format!("{}s", args.timeout.as_secs())),
        (
            "internal_marker_set",
            (!args.internal_marker.is_empty()).to_string(),
        ),
    ];
    log_entries(Service::Backend, &entries);
}
