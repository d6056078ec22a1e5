//! # wakeguard
//!
//! **Wakeguard** keeps a machine awake by holding platform power-management
//! assertions for a caller-specified duration, or for as long as a
//! supervised child process runs, and releases every assertion exactly once
//! no matter how the waiting window ends.
//!
//! ## Architecture
//! ```text
//!   Config (validated by the CLI collaborator)
//!      │
//!      ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │ session::run                                                  │
//! │  - process-wide overlap guard (one session per process)       │
//! │  - AssertionSet::acquire_all  (all-or-nothing, rollback)      │
//! │  - launches watchers, blocks in the Waiter                    │
//! └──────┬────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Waiter (Idle → Armed → Resolved → TornDown)                   │
//! │                                                               │
//! │   timer task ───────────┐                                     │
//! │   child monitor ────────┼──► bounded mpsc ──► single recv()   │
//! │   interrupt listener ───┤   (first event     (resolution      │
//! │   battery watcher ──────┘      wins)           point)         │
//! │                                                               │
//! │   teardown: stop watchers → terminate child (grace-bounded)   │
//! │             → release AssertionSet LAST                       │
//! └──────┬────────────────────────────────────────────────────────┘
//!        ▼
//!   WaitOutcome  ──►  exit code (CLI collaborator)
//! ```
//!
//! ## Guarantees
//! - **All-or-nothing acquisition**: a partially acquired assertion set is
//!   never observable; the first failure rolls back in reverse order.
//! - **Exactly-once release**: release is idempotent at every level and
//!   backstopped by `Drop`, so no exit path leaks an assertion.
//! - **First event wins**: all terminal events funnel through one bounded
//!   channel with a single consumer; concurrent deliveries cannot produce
//!   two outcomes.
//! - **Bounded teardown**: an unresponsive child is SIGTERMed, given a
//!   grace period, then killed; the core never hangs waiting on it.
//!
//! ## Platform
//! The OS is reached only through the [`PowerApi`] and [`BatterySource`]
//! traits. [`Platform::native`] provides the macOS IOKit implementation and
//! fails with [`PlatformError::Unsupported`] elsewhere — absence of a
//! native facility is a fatal startup error, never emulated.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use wakeguard::{Config, Platform};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         timeout: Duration::from_secs(120),
//!         ..Config::default()
//!     };
//!     cfg.validate()?;
//!
//!     let platform = Platform::native()?;
//!     let outcome = wakeguard::session::run(&cfg, &platform).await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

mod assertion;
mod child;
mod config;
mod error;
mod outcome;
pub mod platform;
pub mod session;
pub mod signals;
mod waiter;

// ---- Public re-exports ----

pub use assertion::{AssertionHandle, AssertionKind, AssertionSet};
pub use config::{ChildCommand, Config};
pub use error::{ConfigError, PlatformError, SpawnError, WakeError};
pub use outcome::WaitOutcome;
pub use platform::{AssertionId, AssertionProps, BatterySource, Platform, PowerApi};
