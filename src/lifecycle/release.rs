//! Ordered release of acquired resources.
//!
//! Each resource registers a release step right after it is acquired. On
//! teardown every step runs once, newest first, and failures are collected
//! instead of stopping the sequence.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Boxed error returned by a release step.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

type ReleaseFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// A release step that returned an error.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Name the step was registered under.
    pub name: &'static str,
    /// Error returned by the step.
    pub error: BoxError,
}

/// One or more release steps failed.
#[derive(Debug, Error)]
#[error("failed to release {}", describe(.failures))]
pub struct ReleaseError {
    failures: Vec<ReleaseFailure>,
}

impl ReleaseError {
    /// Failures in the order they happened.
    pub fn failures(&self) -> &[ReleaseFailure] {
        &self.failures
    }
}

fn describe(failures: &[ReleaseFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Release steps for a group of resources.
///
/// `release_all` drains the group: calling it again is a no-op that returns
/// `Ok(())`, so it cannot be used to retry a failed release.
#[derive(Default)]
pub struct ReleaseGroup {
    steps: Vec<(&'static str, ReleaseFn)>,
}

impl ReleaseGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a release step for a resource that was just acquired.
    pub fn register<F>(&mut self, name: &'static str, release: F)
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.steps.push((name, Box::new(release)));
    }

    /// Number of pending release steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every pending step, newest first, and join the failures.
    pub fn release_all(&mut self) -> Result<(), ReleaseError> {
        let mut failures = Vec::new();

        while let Some((name, release)) = self.steps.pop() {
            match release() {
                Ok(()) => tracing::debug!(resource = name, "Released"),
                Err(error) => failures.push(ReleaseFailure { name, error }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReleaseError { failures })
        }
    }
}

impl fmt::Debug for ReleaseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseGroup")
            .field("pending", &self.steps.iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for ReleaseGroup {
    fn drop(&mut self) {
        if self.steps.is_empty() {
            return;
        }
        tracing::warn!(
            pending = self.steps.len(),
            "Release group dropped without explicit release"
        );
        if let Err(e) = self.release_all() {
            tracing::error!(error = %e, "Release on drop failed");
        }
    }
}
