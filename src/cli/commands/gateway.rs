use crate::{backend::guard::DEFAULT_INTERNAL_MARKER, cookie::DEFAULT_COOKIE_NAME};
use clap::{Arg, Command};

#[must_use]
pub fn command() -> Command {
    Command::new("gateway")
        .about("Gateway: validates every request before proxying it to the backend")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("TURNSTILE_GATEWAY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("auth-url")
                .long("auth-url")
                .help("Base URL of the credential service")
                .default_value("http://auth:8081")
                .env("TURNSTILE_AUTH_URL")
                .value_parser(clap::value_parser!(url::Url)),
        )
        .arg(
            Arg::new("backend-url")
                .long("backend-url")
                .help("Base URL of the backend data service")
                .default_value("http://rickmorty:8082")
                .env("TURNSTILE_BACKEND_URL")
                .value_parser(clap::value_parser!(url::Url)),
        )
        .arg(
            Arg::new("cookie-name")
                .long("cookie-name")
                .help("Name of the session cookie")
                .default_value(DEFAULT_COOKIE_NAME)
                .env("TURNSTILE_COOKIE_NAME"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Seconds one request may spend on validation and proxying together")
                .default_value("10")
                .env("TURNSTILE_UPSTREAM_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..=3600)),
        )
        .arg(
            Arg::new("internal-marker")
                .long("internal-marker")
                .help("Value of the X-Internal-Auth header sent to the backend")
                .default_value(DEFAULT_INTERNAL_MARKER)
                .env("TURNSTILE_INTERNAL_MARKER")
                .hide_env_values(true),
        )
}
