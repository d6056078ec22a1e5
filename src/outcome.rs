//! Terminal outcome of one keep-awake invocation.
//!
//! Exactly one [`WaitOutcome`] is produced per invocation, regardless of how
//! many terminal events raced to end it. The CLI collaborator maps it to a
//! process exit code via [`WaitOutcome::exit_code`].

use std::fmt;

/// Which terminal condition ended the waiting window.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum WaitOutcome {
    /// The configured timeout elapsed.
    TimedOut,
    /// The supervised child exited; carries its exit code
    /// (`128 + signal` for signal-terminated children, shell convention).
    ChildExited(i32),
    /// An external interrupt (SIGINT/SIGTERM/Ctrl-C) was observed.
    ///
    /// This is a normal terminal path, not a failure.
    Interrupted,
    /// Battery capacity fell below the configured minimum; carries the
    /// capacity (percent) observed at release time.
    BatteryLow(f32),
    /// A watcher faulted while armed. Teardown still completed and all
    /// assertions were released.
    Error(String),
}

impl WaitOutcome {
    /// Maps the outcome to a process exit code.
    ///
    /// - `TimedOut`, `Interrupted`, `BatteryLow` → `0` (ended by design)
    /// - `ChildExited(code)` → the child's own code
    /// - `Error` → `2`
    pub fn exit_code(&self) -> i32 {
        match self {
            WaitOutcome::TimedOut | WaitOutcome::Interrupted | WaitOutcome::BatteryLow(_) => 0,
            WaitOutcome::ChildExited(code) => *code,
            WaitOutcome::Error(_) => 2,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WaitOutcome::TimedOut => "timed_out",
            WaitOutcome::ChildExited(_) => "child_exited",
            WaitOutcome::Interrupted => "interrupted",
            WaitOutcome::BatteryLow(_) => "battery_low",
            WaitOutcome::Error(_) => "error",
        }
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitOutcome::TimedOut => write!(f, "timed out"),
            WaitOutcome::ChildExited(code) => write!(f, "child exited with code {code}"),
            WaitOutcome::Interrupted => write!(f, "interrupted"),
            WaitOutcome::BatteryLow(pct) => write!(f, "battery low ({pct:.1}%)"),
            WaitOutcome::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(WaitOutcome::TimedOut.exit_code(), 0);
        assert_eq!(WaitOutcome::Interrupted.exit_code(), 0);
        assert_eq!(WaitOutcome::BatteryLow(12.0).exit_code(), 0);
        assert_eq!(WaitOutcome::ChildExited(3).exit_code(), 3);
        assert_eq!(WaitOutcome::Error("boom".into()).exit_code(), 2);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(WaitOutcome::TimedOut.as_label(), "timed_out");
        assert_eq!(WaitOutcome::ChildExited(3).as_label(), "child_exited");
        assert_eq!(WaitOutcome::Interrupted.as_label(), "interrupted");
        assert_eq!(WaitOutcome::BatteryLow(12.0).as_label(), "battery_low");
        assert_eq!(WaitOutcome::Error("boom".into()).as_label(), "error");
    }
}
