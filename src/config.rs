use std::env;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::ConfigError;

/// Trait for service types that read their credential from the environment
pub trait KeyFromEnv {
    /// The environment variable name holding this service's API key
    const KEY_NAME: &'static str;

    /// Find the API key by loading `.env` first, then reading the process environment
    fn find_key() -> Option<String> {
        // A missing .env file is normal in deployments
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Like `find_key`, but absence is a configuration error.
    fn require_key() -> Result<String, ConfigError> {
        Self::find_key().ok_or(ConfigError::MissingKey { name: Self::KEY_NAME })
    }
}

/// Read an optional, non-blank environment variable.
pub fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an optional environment variable.
pub fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => {
            debug!(target: "guided_quiz::config", var = name, "parsing override");
            raw.parse::<T>().map(Some).map_err(|e| {
                warn!(target: "guided_quiz::config", var = name, error = %e, "invalid override");
                ConfigError::Invalid { name, reason: e.to_string() }
            })
        }
        None => Ok(None),
    }
}

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "guided_quiz=info";

/// The log filter directive: `RUST_LOG` when set, otherwise the default.
pub fn log_filter_directive() -> String {
    optional_var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl KeyFromEnv for Probe {
        const KEY_NAME: &'static str = "_GUIDED_QUIZ_PROBE_KEY";
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        env::remove_var(Probe::KEY_NAME);
        let err = Probe::require_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { name: "_GUIDED_QUIZ_PROBE_KEY" }));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        env::set_var("_GUIDED_QUIZ_BLANK_KEY", "   ");
        assert_eq!(optional_var("_GUIDED_QUIZ_BLANK_KEY"), None);
        env::remove_var("_GUIDED_QUIZ_BLANK_KEY");
    }

    #[test]
    fn log_filter_defaults_to_crate_info() {
        env::remove_var("RUST_LOG");
        assert_eq!(log_filter_directive(), "guided_quiz=info");
    }

    #[test]
    fn parse_var_reports_the_variable_name() {
        env::set_var("_GUIDED_QUIZ_TIMEOUT", "soon");
        let err = parse_var::<u64>("_GUIDED_QUIZ_TIMEOUT").unwrap_err();
        assert!(err.to_string().contains("_GUIDED_QUIZ_TIMEOUT"));
        env::remove_var("_GUIDED_QUIZ_TIMEOUT");
    }
}
