use crate::backend::{guard::DEFAULT_INTERNAL_MARKER, source::DEFAULT_DATA_URL};
use clap::{Arg, Command};

#[must_use]
pub fn command() -> Command {
    Command::new("backend")
        .about("Backend data service, reachable through the gateway only")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8082")
                .env("TURNSTILE_BACKEND_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("data-url")
                .long("data-url")
                .help("Base URL of the public data source")
                .default_value(DEFAULT_DATA_URL)
                .env("TURNSTILE_DATA_URL")
                .value_parser(clap::value_parser!(url::Url)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Seconds to wait for the public data source")
                .default_value("10")
                .env("TURNSTILE_UPSTREAM_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..=3600)),
        )
        .arg(
            Arg::new("internal-marker")
                .long("internal-marker")
                .help("Expected value of the X-Internal-Auth header")
                .default_value(DEFAULT_INTERNAL_MARKER)
                .env("TURNSTILE_INTERNAL_MARKER")
                .hide_env_values(true),
        )
}
