use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 4 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level, use error|warn|info|debug|trace or 0..=4".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase verbosity, repeat for more (-v WARN .. -vvvv TRACE)")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long("log-level")
                .help("Log level: error, warn, info, debug, trace (default: error)")
                .env("TURNSTILE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(validator_log_level()),
        )
}

/// Effective verbosity: the larger of the `-v` count and `--log-level`.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    let count = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
    let level = matches.get_one::<u8>(ARG_LOG_LEVEL).copied().unwrap_or(0);
    count.max(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_accepts_names_and_numbers() {
        for (level, expected) in [("error", 0), ("WARN", 1), ("info", 2), ("3", 3), ("trace", 4)] {
            temp_env::with_vars([("TURNSTILE_LOG_LEVEL", Some(level))], || {
                let matches = with_args(Command::new("test")).get_matches_from(vec!["test"]);
                assert_eq!(matches.get_one::<u8>(ARG_LOG_LEVEL).copied(), Some(expected));
                assert_eq!(verbosity(&matches), expected);
            });
        }
    }

    #[test]
    fn validator_rejects_garbage() {
        for level in ["loud", "5"] {
            temp_env::with_vars([("TURNSTILE_LOG_LEVEL", Some(level))], || {
                assert!(with_args(Command::new("test")).try_get_matches_from(vec!["test"]).is_err());
            });
        }
    }

    #[test]
    fn flag_and_level_take_the_larger() {
        temp_env::with_vars([("TURNSTILE_LOG_LEVEL", Some("debug"))], || {
            let matches = with_args(Command::new("test")).get_matches_from(vec!["test", "-v"]);
            assert_eq!(verbosity(&matches), 3);
        });
        temp_env::with_vars([("TURNSTILE_LOG_LEVEL", None::<&str>)], || {
            let matches = with_args(Command::new("test"))
                .get_matches_from(vec!["test", "-vv", "--log-level", "warn"]);
            assert_eq!(verbosity(&matches), 2);
        });
    }
}
