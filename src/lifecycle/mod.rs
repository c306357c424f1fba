//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Telemetry pipeline → AppState → Bind listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain requests → Release telemetry
//!
//! Release (release.rs):
//!     Each acquired resource registers a release step;
//!     teardown runs them newest first and joins their errors
//! ```

pub mod release;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use release::{ReleaseError, ReleaseGroup};
pub use shutdown::Shutdown;
pub use startup::{bootstrap, Service, StartupError};
