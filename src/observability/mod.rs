//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     env.rs (dev | prod)
//!     → pipeline.rs (propagator, resource, providers, release group)
//!     → providers.rs (stdout or OTLP/HTTP exporters)
//!
//! Per request:
//!     tracing.rs (extract context, server span)
//!     → handler (span event, roll.value attribute)
//!     → metrics.rs (dice.rolls counter)
//!
//! Logs:
//!     logging.rs (tracing-subscriber, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - No global state on the request path: handlers receive the tracer and
//!   instruments through explicit state
//! - Export batching and periodic collection are left to the SDK

pub mod env;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod tracing;

pub use env::{parse_env, TelemetryEnv};
pub use metrics::DiceMetrics;
pub use pipeline::{setup_telemetry, setup_with, Signal, Telemetry, TelemetryError};
pub use providers::{ConsoleProviders, OtlpProviders, ProviderFactory};
pub use self::tracing::HttpTelemetry;
