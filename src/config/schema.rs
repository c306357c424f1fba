//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::env::{parse_env, TelemetryEnv};

/// Root configuration for the dice service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Telemetry pipeline settings.
    pub telemetry: TelemetryConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Telemetry configuration.
///
/// `environment` is kept as the raw string so that unknown values can fall
/// back to dev with a warning instead of failing deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Exporter wiring: "dev" (stdout) or "prod" (OTLP/HTTP).
    pub environment: String,

    /// Value of the `service.name` resource attribute.
    pub service_name: String,

    /// Collector base URL, e.g. "https://collector:4318". Required in prod.
    pub otlp_endpoint: Option<String>,

    /// Batch span processor scheduled delay in milliseconds.
    pub trace_batch_delay_ms: u64,

    /// Periodic metric reader interval in seconds.
    pub metric_interval_secs: u64,

    /// Per-export timeout for the OTLP exporters in seconds.
    pub export_timeout_secs: u64,

    /// Register providers and propagator as the process-wide OpenTelemetry globals.
    pub install_global: bool,
}

impl TelemetryConfig {
    /// Parsed environment. Logs a warning for unrecognized values.
    pub fn env(&self) -> TelemetryEnv {
        parse_env(&self.environment)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            service_name: "RollDiceService".to_string(),
            otlp_endpoint: None,
            trace_batch_delay_ms: 1_000,
            metric_interval_secs: 10,
            export_timeout_secs: 10,
            install_global: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "rolldice=info,tower_http=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
