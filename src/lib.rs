//! Dice-rolling HTTP service instrumented with OpenTelemetry.

pub mod config;
pub mod dice;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
