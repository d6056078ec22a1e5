//! Scoped ownership of a single platform assertion.

use std::sync::Arc;

use log::{debug, warn};

use crate::assertion::AssertionKind;
use crate::error::PlatformError;
use crate::platform::{AssertionId, AssertionProps, PowerApi};

/// Owns exactly one platform power assertion.
///
/// The handle is a scoped resource: `release` is idempotent, safe to call on
/// every exit path, and runs from `Drop` as a final backstop. After
/// `release` returns, the suppressed behavior is no longer suppressed by
/// this handle.
pub struct AssertionHandle {
    kind: AssertionKind,
    power: Arc<dyn PowerApi>,
    /// `Some` while Acquired, `None` once Released (or never acquired).
    id: Option<AssertionId>,
}

impl AssertionHandle {
    /// Requests the platform to begin suppressing `kind`.
    ///
    /// Side effect: alters system power-management state immediately.
    ///
    /// # Errors
    /// [`PlatformError`] if the underlying facility rejects the request;
    /// no state is held in that case.
    pub fn acquire(
        power: Arc<dyn PowerApi>,
        kind: AssertionKind,
        props: &AssertionProps,
    ) -> Result<Self, PlatformError> {
        let id = power.acquire(kind, props)?;
        debug!("acquired {} ({id})", kind.describe());
        Ok(Self {
            kind,
            power,
            id: Some(id),
        })
    }

    /// The kind this handle suppresses.
    pub fn kind(&self) -> AssertionKind {
        self.kind
    }

    /// Whether the assertion is currently held.
    pub fn is_held(&self) -> bool {
        self.id.is_some()
    }

    /// Releases the assertion. A second or later call is a no-op.
    pub fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        debug!("releasing {} ({id})", self.kind.describe());
        if let Err(err) = self.power.release(id) {
            // Nothing more to do; the id is gone either way.
            warn!("platform refused release of {id}: {err}");
        }
    }
}

impl Drop for AssertionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPower;
    use std::time::Duration;

    fn props() -> AssertionProps {
        AssertionProps {
            name: "test".into(),
            reason: "test".into(),
            timeout: Duration::ZERO,
        }
    }

    #[test]
    fn release_is_idempotent() {
        let mock = Arc::new(MockPower::new());
        let mut handle = AssertionHandle::acquire(
            mock.clone(),
            AssertionKind::PreventUserIdleSystemSleep,
            &props(),
        )
        .unwrap();
        assert!(handle.is_held());
        assert_eq!(handle.kind(), AssertionKind::PreventUserIdleSystemSleep);

        handle.release();
        handle.release();
        assert!(!handle.is_held());
        assert_eq!(mock.released_total(), 1);
    }

    #[test]
    fn drop_releases() {
        let mock = Arc::new(MockPower::new());
        {
            let _handle = AssertionHandle::acquire(
                mock.clone(),
                AssertionKind::PreventUserIdleDisplaySleep,
                &props(),
            )
            .unwrap();
            assert_eq!(mock.held_count(), 1);
        }
        assert_eq!(mock.held_count(), 0);
    }
}
