//! Mock platform for unit and integration testing.
//!
//! [`MockPower`] records every acquire/release and can be told to reject
//! specific kinds, which is how the all-or-nothing rollback of
//! [`AssertionSet`](crate::AssertionSet) is exercised without touching OS
//! power state. [`MockBattery`] reports a settable capacity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::assertion::AssertionKind;
use crate::error::PlatformError;
use crate::platform::{AssertionId, AssertionProps, BatterySource, PowerApi};

/// Recording power-assertion double with failure injection.
#[derive(Default)]
pub struct MockPower {
    next_id: AtomicU64,
    held: Mutex<HashMap<u64, AssertionKind>>,
    /// Kinds whose acquisition should be rejected.
    fail_kinds: Mutex<Vec<AssertionKind>>,
    /// Running count of successful acquisitions, never decremented.
    acquired_total: AtomicU64,
    /// Running count of releases, never decremented.
    released_total: AtomicU64,
}

impl MockPower {
    /// Creates a mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects future acquisitions of `kind`.
    pub fn fail_on(&self, kind: AssertionKind) {
        self.fail_kinds.lock().unwrap().push(kind);
    }

    /// Whether an assertion of `kind` is currently held.
    pub fn is_held(&self, kind: AssertionKind) -> bool {
        self.held.lock().unwrap().values().any(|k| *k == kind)
    }

    /// Number of assertions currently held.
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Total successful acquisitions over the mock's lifetime.
    pub fn acquired_total(&self) -> u64 {
        self.acquired_total.load(Ordering::SeqCst)
    }

    /// Total releases over the mock's lifetime.
    pub fn released_total(&self) -> u64 {
        self.released_total.load(Ordering::SeqCst)
    }
}

impl PowerApi for MockPower {
    fn acquire(
        &self,
        kind: AssertionKind,
        _props: &AssertionProps,
    ) -> Result<AssertionId, PlatformError> {
        if self.fail_kinds.lock().unwrap().contains(&kind) {
            return Err(PlatformError::AssertionRejected {
                kind: kind.to_string(),
                status: -1,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.held.lock().unwrap().insert(id, kind);
        self.acquired_total.fetch_add(1, Ordering::SeqCst);
        Ok(AssertionId(id))
    }

    fn release(&self, id: AssertionId) -> Result<(), PlatformError> {
        match self.held.lock().unwrap().remove(&id.0) {
            Some(_) => {
                self.released_total.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(PlatformError::UnknownAssertion(id.0)),
        }
    }
}

/// Battery double with a settable capacity.
pub struct MockBattery {
    capacity: Mutex<Option<f32>>,
}

impl MockBattery {
    /// Creates a battery reporting `capacity` percent.
    pub fn at(capacity: f32) -> Self {
        Self {
            capacity: Mutex::new(Some(capacity)),
        }
    }

    /// Changes the reported capacity.
    pub fn set(&self, capacity: f32) {
        *self.capacity.lock().unwrap() = Some(capacity);
    }
}

impl BatterySource for MockBattery {
    fn has_battery(&self) -> bool {
        true
    }

    fn capacity_percent(&self) -> Option<f32> {
        *self.capacity.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn props() -> AssertionProps {
        AssertionProps {
            name: "test".into(),
            reason: "test".into(),
            timeout: Duration::ZERO,
        }
    }

    #[test]
    fn acquire_release_roundtrip() {
        let mock = MockPower::new();
        let id = mock
            .acquire(AssertionKind::PreventUserIdleSystemSleep, &props())
            .unwrap();
        assert!(mock.is_held(AssertionKind::PreventUserIdleSystemSleep));
        mock.release(id).unwrap();
        assert_eq!(mock.held_count(), 0);
    }

    #[test]
    fn double_release_is_reported_on_the_raw_surface() {
        let mock = MockPower::new();
        let id = mock
            .acquire(AssertionKind::PreventUserIdleDisplaySleep, &props())
            .unwrap();
        mock.release(id).unwrap();
        assert!(matches!(
            mock.release(id),
            Err(PlatformError::UnknownAssertion(_))
        ));
    }

    #[test]
    fn injected_failure_rejects_kind() {
        let mock = MockPower::new();
        mock.fail_on(AssertionKind::PreventDiskIdle);
        assert!(mock
            .acquire(AssertionKind::PreventDiskIdle, &props())
            .is_err());
        assert!(mock
            .acquire(AssertionKind::PreventUserIdleSystemSleep, &props())
            .is_ok());
    }
}
