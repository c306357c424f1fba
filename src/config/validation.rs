//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every problem is reported,
//! not just the first one.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;
use crate::observability::env::TelemetryEnv;

/// A single semantic problem in a [`ServiceConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("telemetry.service_name must not be empty")]
    EmptyServiceName,

    #[error("telemetry.otlp_endpoint {endpoint:?} is invalid: {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("telemetry.otlp_endpoint is required when environment is \"prod\"")]
    MissingEndpoint,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    let telemetry = &config.telemetry;
    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if telemetry.trace_batch_delay_ms == 0 {
        errors.push(ValidationError::ZeroDuration("telemetry.trace_batch_delay_ms"));
    }
    if telemetry.metric_interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("telemetry.metric_interval_secs"));
    }
    if telemetry.export_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("telemetry.export_timeout_secs"));
    }

    match telemetry.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            if let Err(reason) = check_endpoint(endpoint) {
                errors.push(ValidationError::Endpoint {
                    endpoint: endpoint.to_string(),
                    reason,
                });
            }
        }
        None if telemetry.environment == TelemetryEnv::Prod.as_str() => {
            errors.push(ValidationError::MissingEndpoint);
        }
        None => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(endpoint: &str) -> Result<(), String> {
    let url = Url::parse(endpoint).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other:?}")),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn prod_requires_endpoint() {
        let mut config = ServiceConfig::default();
        config.telemetry.environment = "prod".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingEndpoint]);

        config.telemetry.otlp_endpoint = Some("https://collector:4318".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_environment_is_not_an_error() {
        let mut config = ServiceConfig::default();
        config.telemetry.environment = "staging".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.telemetry.service_name = "  ".into();
        config.telemetry.otlp_endpoint = Some("ftp://collector".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyServiceName));
        assert!(errors.contains(&ValidationError::ZeroDuration("timeouts.request_secs")));
        assert!(matches!(
            errors.iter().find(|e| matches!(e, ValidationError::Endpoint { .. })),
            Some(ValidationError::Endpoint { reason, .. }) if reason.contains("ftp")
        ));
    }
}
