//! Telemetry environment selection.

use std::fmt;

/// Which exporters the telemetry pipeline is wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TelemetryEnv {
    /// Console exporters on stdout.
    #[default]
    Dev,
    /// OTLP/HTTP exporters to a collector.
    Prod,
}

impl TelemetryEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEnv::Dev => "dev",
            TelemetryEnv::Prod => "prod",
        }
    }
}

impl fmt::Display for TelemetryEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an environment name. Unknown values fall back to [`TelemetryEnv::Dev`]
/// with a warning.
pub fn parse_env(raw: &str) -> TelemetryEnv {
    match raw {
        "prod" => TelemetryEnv::Prod,
        "dev" => TelemetryEnv::Dev,
        other => {
            tracing::warn!(env = %other, "Unknown telemetry environment, using \"dev\"");
            TelemetryEnv::Dev
        }
    }
}
