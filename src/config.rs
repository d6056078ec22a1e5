//! Invocation configuration.
//!
//! Provides [`Config`], the immutable struct handed to the core by the CLI
//! collaborator. The collaborator calls [`Config::validate`] before entering
//! the core; the core trusts the contract and never re-validates.
//!
//! ## Sentinel values
//! - `timeout = Duration::ZERO` → no timeout. The timer is never armed; the
//!   session runs until the child exits or an interrupt arrives. This is a
//!   documented edge-case policy ("no timeout", never "immediate timeout").
//! - `min_battery = None` → the battery watcher is never armed.
//!
//! With no timeout *and* no child command the session waits indefinitely
//! until interrupted, matching the platform tools this crate is modeled on.

use std::time::Duration;

use crate::assertion::AssertionKind;
use crate::error::ConfigError;

/// A child command to supervise while assertions are held.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl ChildCommand {
    /// Builds a command from a program and its arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Immutable configuration for one keep-awake invocation.
///
/// ## Field semantics
/// - `kinds`: which sleep behaviors to suppress; duplicates collapse, the
///   acquisition order is the [`AssertionKind`] enum order (stable).
/// - `timeout`: hard upper bound on how long assertions are held
///   (`ZERO` = none). Also forwarded to the platform acquire call as an
///   OS-side backstop interval.
/// - `child`: optional command supervised while assertions are held.
/// - `grace`: how long a terminated child may take to exit before it is
///   killed outright.
/// - `min_battery`: release everything once battery capacity falls below
///   this percentage (only meaningful on machines with a battery).
/// - `name` / `reason`: strings attached to the platform assertions, visible
///   in OS power-management diagnostics.
#[derive(Clone, Debug)]
pub struct Config {
    /// Sleep behaviors to suppress.
    pub kinds: Vec<AssertionKind>,
    /// Hard upper bound on the waiting window. `ZERO` = no timeout.
    pub timeout: Duration,
    /// Optional supervised child command.
    pub child: Option<ChildCommand>,
    /// Grace period for child termination before a hard kill.
    pub grace: Duration,
    /// Optional minimum battery capacity in percent.
    pub min_battery: Option<f32>,
    /// Battery polling interval.
    pub battery_poll: Duration,
    /// Tool name used in platform assertion records and logs.
    pub name: String,
    /// Human-readable reason attached to every assertion.
    pub reason: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kinds: vec![AssertionKind::PreventUserIdleSystemSleep],
            timeout: Duration::ZERO,
            child: None,
            grace: Duration::from_secs(5),
            min_battery: None,
            battery_poll: Duration::from_secs(30),
            name: "wakeguard".to_string(),
            reason: "keeping the system awake".to_string(),
        }
    }
}

impl Config {
    /// Checks the contract the core relies on.
    ///
    /// Belongs to the CLI collaborator: call it once, before
    /// [`session::run`](crate::session::run). A `ZERO` timeout with no child
    /// command is accepted and means "wait until interrupted".
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kinds.is_empty() {
            return Err(ConfigError::NoAssertionKinds);
        }
        if let Some(child) = &self.child {
            if child.program.is_empty() {
                return Err(ConfigError::EmptyChildCommand);
            }
        }
        if let Some(pct) = self.min_battery {
            if !(pct > 0.0 && pct < 100.0) {
                return Err(ConfigError::BatteryThresholdOutOfRange(pct));
            }
        }
        Ok(())
    }

    /// Requested kinds, deduplicated, in stable (enum) order.
    pub fn requested_kinds(&self) -> Vec<AssertionKind> {
        let mut kinds = self.kinds.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Returns the timeout as an `Option`, resolving the `ZERO` sentinel.
    #[inline]
    pub fn timeout_opt(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}
