//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. Telemetry comes up before the
//! listener so the first request is already traced.

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::http::server::AppState;
use crate::observability::{setup_telemetry, DiceMetrics, Telemetry, TelemetryError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the HTTP layer needs, plus the telemetry it must outlive.
#[derive(Debug)]
pub struct Service {
    pub telemetry: Telemetry,
    pub state: AppState,
}

/// Bring up telemetry and build the handler state.
///
/// Exporters may build blocking HTTP clients, so call this outside the
/// async runtime.
pub fn bootstrap(config: &ServiceConfig) -> Result<Service, StartupError> {
    let telemetry_config = &config.telemetry;
    tracing::info!(
        service.name = %telemetry_config.service_name,
        service.version = env!("CARGO_PKG_VERSION"),
        env = %telemetry_config.environment,
        "Starting"
    );

    let telemetry = setup_telemetry(telemetry_config)?;
    if telemetry_config.install_global {
        telemetry.install_global();
    }

    let state = AppState::new(
        DiceMetrics::new(&telemetry.meter()),
        telemetry.http_telemetry(),
    );
    Ok(Service { telemetry, state })
}
