//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Selects the telemetry environment ("dev" or "prod").
pub const ENV_TELEMETRY_ENV: &str = "ROLLDICE_ENV";
/// Collector endpoint URL for prod export.
pub const ENV_OTLP_ENDPOINT: &str = "OTLPMETRICHTTP_ENDPOINT";
/// Listener bind address.
pub const ENV_BIND_ADDRESS: &str = "ROLLDICE_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

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

/// Read configuration from a TOML file, or start from defaults when no path is given.
///
/// No validation happens here; callers layer overrides first.
pub fn read_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(ServiceConfig::default()),
    }
}

/// Apply environment variable overrides using `lookup` to resolve names.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(env) = lookup(ENV_TELEMETRY_ENV) {
        config.telemetry.environment = env;
    }
    if let Some(endpoint) = lookup(ENV_OTLP_ENDPOINT) {
        config.telemetry.otlp_endpoint = Some(endpoint);
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}

/// Values given on the command line. They win over the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub environment: Option<String>,
    pub bind_address: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(env) = self.environment {
            config.telemetry.environment = env;
        }
        if let Some(addr) = self.bind_address {
            config.listener.bind_address = addr;
        }
    }
}

/// Read the file, layer the process environment and `overrides` on top, then validate.
pub fn load_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<ServiceConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
