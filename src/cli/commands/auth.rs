use crate::{auth::storage::DEFAULT_DSN, cookie::DEFAULT_COOKIE_NAME};
use clap::{builder::FalseyValueParser, Arg, ArgAction, Command};

#[must_use]
pub fn command() -> Command {
    Command::new("auth")
        .about("Credential service: register, login and validate session tokens")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8081")
                .env("TURNSTILE_AUTH_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("User store connection string")
                .default_value(DEFAULT_DSN)
                .env("TURNSTILE_AUTH_DSN"),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help("Secret used to sign session tokens")
                .long_help(
                    "Secret used to sign session tokens. Without it the service still starts, but every login and validate request fails.",
                )
                .env("TURNSTILE_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("cookie-name")
                .long("cookie-name")
                .help("Name of the session cookie")
                .default_value(DEFAULT_COOKIE_NAME)
                .env("TURNSTILE_COOKIE_NAME"),
        )
        .arg(
            Arg::new("cookie-secure")
                .long("cookie-secure")
                .help("Mark the session cookie as Secure")
                .env("TURNSTILE_COOKIE_SECURE")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new("max-uses")
                .long("max-uses")
                .help("Number of validations a token allows")
                .default_value("5")
                .env("TURNSTILE_MAX_USES")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .help("Token lifetime in seconds")
                .default_value("86400")
                .env("TURNSTILE_TOKEN_TTL")
                .value_parser(clap::value_parser!(i64).range(1..=31_536_000)),
        )
        .arg(
            Arg::new("sweep-interval")
                .long("sweep-interval")
                .help("Seconds between sweeps of expired tokens, 0 disables the sweep")
                .default_value("300")
                .env("TURNSTILE_SWEEP_INTERVAL")
                .value_parser(clap::value_parser!(u64).range(0..=86_400)),
        )
}
