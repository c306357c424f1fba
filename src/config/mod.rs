//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (ROLLDICE_ENV, OTLPMETRICHTTP_ENDPOINT, ...)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the service runs with no config file
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment reads happen once, here, and nowhere else

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, read_config, ConfigError, Overrides};
pub use schema::{
    ListenerConfig, LogFormat, LoggingConfig, ServiceConfig, TelemetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
