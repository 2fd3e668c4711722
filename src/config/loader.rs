//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::ValidationError;

/// Environment variable holding the RPC listen address.
pub const ENV_GRPC_PORT: &str = "GRPC_PORT";
/// Environment variable holding the HTTP listen address.
pub const ENV_HTTP_PORT: &str = "HTTP_PORT";
/// Environment variable holding the log level.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable holding the log format.
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is not validated yet.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    Ok(config)
}

/// Overlay environment values onto `config` using `lookup`.
///
/// Empty values are ignored.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

    if let Some(value) = get(ENV_GRPC_PORT) {
        config.grpc_address = value;
    }
    if let Some(value) = get(ENV_HTTP_PORT) {
        config.http_address = value;
    }
    if let Some(value) = get(ENV_LOG_LEVEL) {
        config.log.level = value;
    }
    if let Some(value) = get(ENV_LOG_FORMAT) {
        config.log.format = value.parse().map_err(|reason| ConfigError::Env {
            var: ENV_LOG_FORMAT,
            reason,
        })?;
    }

    Ok(())
}
