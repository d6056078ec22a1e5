//! One keep-awake invocation, end to end.
//!
//! [`run`] wires the pieces together in the order the contract demands:
//! acquire the assertion set, start the configured watchers (the interrupt
//! listener always runs), block in the waiter, and hand back exactly one
//! [`WaitOutcome`]. Any failure before the waiter is armed rolls back fully;
//! no exit path leaves an assertion held.
//!
//! Overlapping invocations within one process are rejected: the platform's
//! power state is a process-global resource, and a single active session is
//! the discipline that keeps release bookkeeping exact. The guard clears on
//! teardown, so sequential invocations work.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use tokio_util::sync::CancellationToken;

use crate::assertion::AssertionSet;
use crate::child::ChildSupervisor;
use crate::config::Config;
use crate::error::WakeError;
use crate::outcome::WaitOutcome;
use crate::platform::{AssertionProps, Platform};
use crate::signals;
use crate::waiter::Waiter;

/// Process-wide marker: set while any session holds assertions.
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Clears the process-wide marker on every exit path.
struct ActiveGuard;

impl ActiveGuard {
    fn acquire() -> Result<Self, WakeError> {
        if ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Ok(Self)
        } else {
            Err(WakeError::AlreadyRunning)
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Runs one keep-awake session with the real interrupt listener.
///
/// `cfg` must already be validated by the caller
/// ([`Config::validate`]); the core trusts the contract and does not
/// re-check it.
///
/// # Errors
/// - [`WakeError::Platform`] — acquisition rejected; full rollback done.
/// - [`WakeError::Spawn`] — child could not start; assertions released.
/// - [`WakeError::AlreadyRunning`] — another session is active in-process.
pub async fn run(cfg: &Config, platform: &Platform) -> Result<WaitOutcome, WakeError> {
    run_with_interrupt(cfg, platform, signals::spawn_interrupt_listener()).await
}

/// Like [`run`], but with a caller-supplied interrupt token.
///
/// Cancelling `interrupt` delivers the external-interrupt terminal event.
/// This is the embedding/testing entry point; [`run`] wires the token to
/// the OS signal listener.
pub async fn run_with_interrupt(
    cfg: &Config,
    platform: &Platform,
    interrupt: CancellationToken,
) -> Result<WaitOutcome, WakeError> {
    let _guard = ActiveGuard::acquire()?;

    match cfg.timeout_opt() {
        Some(timeout) => info!("asserting for {timeout:?}"),
        None => info!("asserting indefinitely"),
    }

    let props = AssertionProps {
        name: cfg.name.clone(),
        reason: cfg.reason.clone(),
        timeout: cfg.timeout,
    };
    let kinds = cfg.requested_kinds();
    let mut set = AssertionSet::acquire_all(platform.power.clone(), &kinds, &props)?;

    let mut waiter = Waiter::new(cfg.grace);
    if let Some(timeout) = cfg.timeout_opt() {
        waiter.arm_timer(timeout);
    }
    if let Some(cmd) = &cfg.child {
        match ChildSupervisor::launch(cmd, cfg.grace, waiter.sender()) {
            Ok(supervisor) => waiter.attach_child(supervisor),
            Err(err) => {
                // Fatal before arming: nothing may stay held.
                set.release_all();
                return Err(err.into());
            }
        }
    }
    if let (Some(min), Some(battery)) = (cfg.min_battery, platform.battery.clone()) {
        waiter.arm_battery(battery, min, cfg.battery_poll);
    }
    waiter.arm_interrupt(interrupt);

    let outcome = waiter.wait(set).await;
    info!("session resolved: {} ({outcome})", outcome.as_label());
    Ok(outcome)
}
