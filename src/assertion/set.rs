//! All-or-nothing acquisition of a group of assertions.

use std::sync::Arc;

use log::{debug, info};

use crate::assertion::{AssertionHandle, AssertionKind};
use crate::error::PlatformError;
use crate::platform::{AssertionProps, PowerApi};

/// Ordered collection of [`AssertionHandle`]s, one per requested kind.
///
/// Invariant: after construction either every requested kind is held, or
/// `acquire_all` has rolled back every partial acquisition (in reverse
/// order) and returned an error. A half-acquired set is never observable.
pub struct AssertionSet {
    handles: Vec<AssertionHandle>,
}

impl AssertionSet {
    /// Acquires one assertion per kind, in the given (stable) order.
    ///
    /// On the first failure, handles already acquired in this call are
    /// released in reverse order before the error is returned; remaining
    /// kinds are not attempted.
    pub fn acquire_all(
        power: Arc<dyn PowerApi>,
        kinds: &[AssertionKind],
        props: &AssertionProps,
    ) -> Result<Self, PlatformError> {
        let mut handles: Vec<AssertionHandle> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            match AssertionHandle::acquire(power.clone(), kind, props) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    debug!("rollback after failed acquire of {kind}");
                    for handle in handles.iter_mut().rev() {
                        handle.release();
                    }
                    return Err(err);
                }
            }
        }
        let held: Vec<String> = handles.iter().map(|h| h.kind().to_string()).collect();
        info!("holding {} assertion(s): {}", handles.len(), held.join(", "));
        Ok(Self { handles })
    }

    /// Releases every contained handle. Idempotent; safe to call repeatedly.
    pub fn release_all(&mut self) {
        for handle in self.handles.iter_mut().rev() {
            handle.release();
        }
    }

    /// Number of kinds in the set (held or already released).
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True for the empty set.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Whether any assertion in the set is still held.
    pub fn any_held(&self) -> bool {
        self.handles.iter().any(AssertionHandle::is_held)
    }
}
