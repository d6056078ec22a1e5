//! Enumerates the sleep behaviors a platform assertion can suppress.

use std::fmt;

/// One platform sleep-prevention capability.
///
/// The enum order is the stable acquisition order used by
/// [`AssertionSet`](crate::AssertionSet); duplicates in a request collapse
/// to one.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssertionKind {
    /// Prevent the system from idle-sleeping due to lack of user activity.
    PreventUserIdleSystemSleep,
    /// Prevent the display from dimming/sleeping due to lack of activity.
    PreventUserIdleDisplaySleep,
    /// Prevent disks from spinning down when idle.
    PreventDiskIdle,
    /// Prevent system sleep entirely (effective on AC power).
    PreventSystemSleep,
}

impl AssertionKind {
    /// Platform assertion-type string, as understood by IOKit.
    pub fn assertion_type(&self) -> &'static str {
        match self {
            AssertionKind::PreventUserIdleSystemSleep => "PreventUserIdleSystemSleep",
            AssertionKind::PreventUserIdleDisplaySleep => "PreventUserIdleDisplaySleep",
            AssertionKind::PreventDiskIdle => "PreventDiskIdle",
            AssertionKind::PreventSystemSleep => "PreventSystemSleep",
        }
    }

    /// Short human-readable description for logs and diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            AssertionKind::PreventUserIdleSystemSleep => "idle system sleep",
            AssertionKind::PreventUserIdleDisplaySleep => "idle display sleep",
            AssertionKind::PreventDiskIdle => "disk idle",
            AssertionKind::PreventSystemSleep => "system sleep",
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.assertion_type())
    }
}
