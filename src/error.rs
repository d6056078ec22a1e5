//! Error types used by the wakeguard core.
//!
//! This module defines the error taxonomy from the outside in:
//!
//! - [`ConfigError`] — a configuration was rejected before the core is entered.
//! - [`PlatformError`] — the OS power-assertion facility rejected a request
//!   (or does not exist on this platform).
//! - [`SpawnError`] — the supervised child command could not be started.
//! - [`WakeError`] — top-level error returned by [`session::run`](crate::session::run),
//!   wrapping the above plus the process-wide overlap guard.
//!
//! Failures that occur *while armed* (e.g. a watcher faulting mid-wait) are
//! not errors in this sense: they are captured as
//! [`WaitOutcome::Error`](crate::WaitOutcome::Error) so that teardown always
//! completes and no assertion is left held.

use thiserror::Error;

/// Errors from the platform power-assertion boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The OS rejected an assertion request (invalid reason string,
    /// resource exhaustion, permissions).
    #[error("power assertion '{kind}' rejected by the platform (status {status})")]
    AssertionRejected {
        /// Human-readable assertion kind that was requested.
        kind: String,
        /// Raw platform status code, for logs.
        status: i32,
    },

    /// An assertion id was released twice or never acquired.
    ///
    /// Callers never see this through [`AssertionHandle`](crate::AssertionHandle),
    /// whose release is idempotent; it exists for the raw trait surface.
    #[error("unknown assertion id {0}")]
    UnknownAssertion(u64),

    /// The current platform has no native power-assertion facility.
    ///
    /// This is a fatal startup condition, never emulated in software.
    #[error("no native power-assertion facility on this platform")]
    Unsupported,
}

impl PlatformError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PlatformError::AssertionRejected { .. } => "assertion_rejected",
            PlatformError::UnknownAssertion(_) => "unknown_assertion",
            PlatformError::Unsupported => "platform_unsupported",
        }
    }
}

/// The supervised child command could not be started.
///
/// Spawn failures are fatal: they occur before the waiter is armed, and the
/// session rolls back every assertion before surfacing this error.
#[derive(Error, Debug)]
#[error("failed to spawn '{program}': {source}")]
pub struct SpawnError {
    /// The program that could not be started.
    pub program: String,
    /// The underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// A configuration was rejected by validation.
///
/// Validation belongs to the CLI collaborator; the core trusts a validated
/// [`Config`](crate::Config) and never re-checks these conditions.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// No assertion kind was selected.
    #[error("no assertion kind selected; nothing to suppress")]
    NoAssertionKinds,

    /// The child command is present but has an empty program name.
    #[error("child command is empty")]
    EmptyChildCommand,

    /// The minimum battery threshold is outside (0, 100).
    #[error("minimum battery capacity {0}% is outside (0, 100)")]
    BatteryThresholdOutOfRange(f32),
}

/// Top-level error for one keep-awake invocation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WakeError {
    /// Assertion acquisition failed; every partial acquisition was rolled back.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The child command could not be started; assertions were released.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The configuration was rejected before the core was entered.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Another invocation is already holding assertions in this process.
    ///
    /// Overlapping invocations are disallowed; run them sequentially.
    #[error("another keep-awake session is already running in this process")]
    AlreadyRunning,
}
