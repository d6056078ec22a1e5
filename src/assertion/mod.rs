//! Power-assertion ownership: kinds, scoped handles, all-or-nothing sets.
//!
//! ```text
//! AssertionSet::acquire_all(kinds)
//!     ├─► AssertionHandle::acquire(kind₀)  ─ ok
//!     ├─► AssertionHandle::acquire(kind₁)  ─ ok
//!     ├─► AssertionHandle::acquire(kind₂)  ─ FAILS
//!     │        └─► release kind₁, kind₀ (reverse order)
//!     └─► Err(PlatformError)               ─ nothing left held
//! ```
//!
//! Release is idempotent at every level and additionally runs on drop, so
//! no exit path can leak an assertion.

mod handle;
mod kind;
mod set;

pub use handle::AssertionHandle;
pub use kind::AssertionKind;
pub use set::AssertionSet;
