//! Platform boundary: abstract power-assertion and battery capabilities.
//!
//! The core touches the operating system in exactly two places, both modeled
//! as trait objects so tests can substitute doubles:
//!
//! - [`PowerApi`] — acquire/release one power assertion by kind.
//! - [`BatterySource`] — probe battery presence and remaining capacity.
//!
//! [`Platform::native`] selects the real implementation for the current OS
//! and fails with [`PlatformError::Unsupported`] where none exists. Absence
//! of a native facility is a fatal startup condition by design; nothing is
//! emulated in software.
//!
//! ```text
//!                 ┌──────────────┐
//!  AssertionSet ──►   PowerApi   ├──► iokit (macOS)  / MockPower (tests)
//!                 └──────────────┘
//!                 ┌──────────────┐
//!  Waiter ────────► BatterySource├──► iokit (macOS)  / MockBattery (tests)
//!   (battery      └──────────────┘
//!    watcher)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::assertion::AssertionKind;
use crate::error::PlatformError;

#[cfg(target_os = "macos")]
mod iokit;
pub mod mock;

/// Opaque identifier of one held platform assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssertionId(pub u64);

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Properties attached to an assertion at acquire time.
///
/// `timeout` is forwarded to the OS as a backstop interval: even if this
/// process wedges, the platform releases the assertion once it elapses
/// (`ZERO` = no backstop).
#[derive(Clone, Debug)]
pub struct AssertionProps {
    /// Tool name shown in platform power-management diagnostics.
    pub name: String,
    /// Human-readable reason for holding the assertion.
    pub reason: String,
    /// OS-side backstop interval; `ZERO` = indefinite.
    pub timeout: Duration,
}

/// The abstract power-assertion capability.
///
/// Implementations alter system power-management state immediately on
/// `acquire` and must accept `release` for every id they handed out.
/// Calls are synchronous; the underlying OS calls do not block meaningfully.
pub trait PowerApi: Send + Sync {
    /// Begins suppressing the behavior named by `kind`.
    fn acquire(
        &self,
        kind: AssertionKind,
        props: &AssertionProps,
    ) -> Result<AssertionId, PlatformError>;

    /// Stops suppressing; after this returns, the behavior is no longer
    /// suppressed by the given assertion.
    fn release(&self, id: AssertionId) -> Result<(), PlatformError>;
}

/// The abstract battery capability.
///
/// Only consulted when a minimum battery threshold is configured.
pub trait BatterySource: Send + Sync {
    /// Whether the machine has a built-in battery at all.
    fn has_battery(&self) -> bool;

    /// Remaining capacity in percent (0–100), or `None` if unreadable.
    fn capacity_percent(&self) -> Option<f32>;
}

/// Bundle of platform capabilities for one invocation.
#[derive(Clone)]
pub struct Platform {
    /// Power-assertion facility.
    pub power: Arc<dyn PowerApi>,
    /// Battery probe, absent where the platform offers none.
    pub battery: Option<Arc<dyn BatterySource>>,
}

impl Platform {
    /// Selects the native implementation for the current OS.
    ///
    /// # Errors
    /// [`PlatformError::Unsupported`] on platforms without a native
    /// power-assertion facility. Callers treat this as fatal at startup.
    #[cfg(target_os = "macos")]
    pub fn native() -> Result<Self, PlatformError> {
        let io = Arc::new(iokit::IoKitPower::new());
        Ok(Self {
            power: io,
            battery: Some(Arc::new(iokit::IoKitBattery::new())),
        })
    }

    /// Selects the native implementation for the current OS.
    ///
    /// # Errors
    /// [`PlatformError::Unsupported`] on platforms without a native
    /// power-assertion facility. Callers treat this as fatal at startup.
    #[cfg(not(target_os = "macos"))]
    pub fn native() -> Result<Self, PlatformError> {
        Err(PlatformError::Unsupported)
    }

    /// Wraps a power facility with no battery probe.
    pub fn new(power: Arc<dyn PowerApi>) -> Self {
        Self {
            power,
            battery: None,
        }
    }

    /// Attaches a battery probe.
    pub fn with_battery(mut self, battery: Arc<dyn BatterySource>) -> Self {
        self.battery = Some(battery);
        self
    }
}
