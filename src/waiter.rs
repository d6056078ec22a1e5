//! The waiter: blocks until the first terminal event, then tears down.
//!
//! ## State machine
//! ```text
//! Idle ──arm_*()──► Armed ──first event──► Resolved ──teardown──► TornDown
//! ```
//!
//! - `Idle`: no watchers started.
//! - `Armed`: assertions held; timer / child monitor / interrupt listener /
//!   battery watcher active; blocking wait in progress.
//! - `Resolved`: exactly one terminal event latched; remaining watchers are
//!   being stopped.
//! - `TornDown`: assertions released, watchers stopped, outcome finalized.
//!   Terminal; a waiter is not reused.
//!
//! ## Resolution point
//! Every watcher funnels into one bounded mpsc channel and the waiter reads
//! exactly **one** event from it. The channel serializes concurrent
//! deliveries, so when timeout and child exit land in the same instant the
//! first `try_send` wins and the rest are discarded — one outcome per
//! invocation, provably, with no shared flags.
//!
//! ## Teardown order
//! Stop remaining watchers first, release the assertion set **last**: the
//! assertions cover the whole observable waiting window, including the
//! moment a terminated child is being reaped.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::assertion::AssertionSet;
use crate::child::ChildSupervisor;
use crate::outcome::WaitOutcome;
use crate::platform::BatterySource;

/// Extra headroom over the child grace when joining the monitor task.
const JOIN_SLACK: Duration = Duration::from_secs(1);

/// Capacity of the resolution channel. Bounded on purpose: one event is
/// consumed, a handful may race in behind it and are dropped unread.
const EVENT_CAPACITY: usize = 4;

/// One terminal event delivered by a watcher.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum WaitEvent {
    /// The countdown elapsed.
    Timeout,
    /// The supervised child exited with the given code.
    ChildExited(i32),
    /// An external interrupt was observed.
    Interrupted,
    /// Battery capacity fell below the configured minimum.
    BatteryLow(f32),
    /// A watcher faulted while armed.
    Fault(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WaiterState {
    Idle,
    Armed,
    Resolved,
    TornDown,
}

/// Core orchestrator for one invocation.
///
/// Given an already-acquired [`AssertionSet`], blocks until the first of
/// {timer expiry, child exit, interrupt, battery threshold} and guarantees
/// exactly-once teardown regardless of which fired.
pub(crate) struct Waiter {
    tx: mpsc::Sender<WaitEvent>,
    rx: mpsc::Receiver<WaitEvent>,
    stop: CancellationToken,
    grace: Duration,
    child: Option<ChildSupervisor>,
    state: WaiterState,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // Stops any armed watcher if the waiter is abandoned before (or
        // after) resolution; cancelling twice is a no-op.
        self.stop.cancel();
    }
}

impl Waiter {
    pub fn new(grace: Duration) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        Self {
            tx,
            rx,
            stop: CancellationToken::new(),
            grace,
            child: None,
            state: WaiterState::Idle,
        }
    }

    /// Sender side of the resolution channel, for watcher construction.
    pub fn sender(&self) -> mpsc::Sender<WaitEvent> {
        self.tx.clone()
    }

    /// Arms the one-shot countdown. Callers skip this for a zero duration
    /// ("no timeout", never "immediate timeout").
    pub fn arm_timer(&mut self, duration: Duration) {
        debug_assert!(duration > Duration::ZERO);
        self.state = WaiterState::Armed;
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(duration) => {
                    let _ = tx.try_send(WaitEvent::Timeout);
                }
                _ = stop.cancelled() => {}
            }
        });
    }

    /// Arms the interrupt watcher on a one-shot token.
    ///
    /// The token usually comes from
    /// [`signals::spawn_interrupt_listener`](crate::signals::spawn_interrupt_listener);
    /// tests cancel a plain token instead of raising signals.
    pub fn arm_interrupt(&mut self, interrupt: CancellationToken) {
        self.state = WaiterState::Armed;
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.cancelled() => {
                    let _ = tx.try_send(WaitEvent::Interrupted);
                }
                _ = stop.cancelled() => {}
            }
        });
    }

    /// Adopts an already-launched child supervisor.
    ///
    /// The supervisor reports exit through this waiter's channel; the waiter
    /// owns its termination during teardown.
    pub fn attach_child(&mut self, child: ChildSupervisor) {
        self.state = WaiterState::Armed;
        self.child = Some(child);
    }

    /// Arms the battery watcher: polls `source` and fires once capacity
    /// drops below `min_percent`. Machines without a battery never fire.
    pub fn arm_battery(
        &mut self,
        source: std::sync::Arc<dyn BatterySource>,
        min_percent: f32,
        poll: Duration,
    ) {
        self.state = WaiterState::Armed;
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            if !source.has_battery() {
                debug!("no battery present; battery watcher idle");
                return;
            }
            let mut ticker = time::interval(poll);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match source.capacity_percent() {
                            Some(pct) if pct < min_percent => {
                                let _ = tx.try_send(WaitEvent::BatteryLow(pct));
                                return;
                            }
                            Some(_) => {}
                            None => warn!("battery capacity unreadable; will retry"),
                        }
                    }
                    _ = stop.cancelled() => return,
                }
            }
        });
    }

    /// Blocks until the first terminal event, then tears down and returns.
    ///
    /// Consumes the waiter and the assertion set: on return the set is fully
    /// released, all watchers are stopped, and the state is terminal.
    pub async fn wait(mut self, mut set: AssertionSet) -> WaitOutcome {
        debug_assert_eq!(self.state, WaiterState::Armed);

        // Single resolution point. `self` holds a sender, so recv() cannot
        // observe a closed channel; the fallback keeps the teardown path
        // total anyway.
        let event = match self.rx.recv().await {
            Some(event) => event,
            None => WaitEvent::Fault("resolution channel closed".to_string()),
        };
        self.state = WaiterState::Resolved;
        debug!("resolved by {event:?}");

        // Stop remaining watchers first...
        self.stop.cancel();
        if let Some(child) = self.child.take() {
            if !matches!(event, WaitEvent::ChildExited(_)) {
                child.terminate();
            }
            child.wait_stopped(self.grace + JOIN_SLACK).await;
        }

        // ...release the assertion set last.
        set.release_all();
        self.state = WaiterState::TornDown;

        let outcome = match event {
            WaitEvent::Timeout => WaitOutcome::TimedOut,
            WaitEvent::ChildExited(code) => WaitOutcome::ChildExited(code),
            WaitEvent::Interrupted => WaitOutcome::Interrupted,
            WaitEvent::BatteryLow(pct) => WaitOutcome::BatteryLow(pct),
            WaitEvent::Fault(reason) => WaitOutcome::Error(reason),
        };
        info!("wait ended: {outcome}");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::AssertionKind;
    use crate::platform::mock::MockPower;
    use crate::platform::AssertionProps;
    use std::sync::Arc;

    fn acquired_set(mock: &Arc<MockPower>) -> AssertionSet {
        let props = AssertionProps {
            name: "test".into(),
            reason: "test".into(),
            timeout: Duration::ZERO,
        };
        AssertionSet::acquire_all(
            mock.clone(),
            &[AssertionKind::PreventUserIdleSystemSleep],
            &props,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_resolves_timed_out() {
        let mock = Arc::new(MockPower::new());
        let set = acquired_set(&mock);

        let mut waiter = Waiter::new(Duration::from_secs(1));
        waiter.arm_timer(Duration::from_secs(2));
        let outcome = waiter.wait(set).await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(mock.held_count(), 0);
    }

    #[tokio::test]
    async fn interrupt_resolves_and_releases_after_observation() {
        let mock = Arc::new(MockPower::new());
        let set = acquired_set(&mock);

        let interrupt = CancellationToken::new();
        let mut waiter = Waiter::new(Duration::from_secs(1));
        waiter.arm_interrupt(interrupt.clone());

        assert_eq!(mock.held_count(), 1);
        interrupt.cancel();
        let outcome = waiter.wait(set).await;

        assert_eq!(outcome, WaitOutcome::Interrupted);
        assert_eq!(mock.held_count(), 0);
    }

    #[tokio::test]
    async fn first_event_wins_when_two_race() {
        let mock = Arc::new(MockPower::new());
        let set = acquired_set(&mock);

        let mut waiter = Waiter::new(Duration::from_secs(1));
        let tx = waiter.sender();
        waiter.arm_timer(Duration::from_secs(300));

        // Two deliveries land before the waiter reads; exactly one wins.
        tx.try_send(WaitEvent::ChildExited(7)).unwrap();
        let _ = tx.try_send(WaitEvent::Interrupted);

        let outcome = waiter.wait(set).await;
        assert_eq!(outcome, WaitOutcome::ChildExited(7));
        assert_eq!(mock.held_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn battery_threshold_fires() {
        let mock = Arc::new(MockPower::new());
        let set = acquired_set(&mock);

        let battery = Arc::new(crate::platform::mock::MockBattery::at(10.0));
        let mut waiter = Waiter::new(Duration::from_secs(1));
        waiter.arm_battery(battery, 20.0, Duration::from_secs(30));

        let outcome = waiter.wait(set).await;
        assert_eq!(outcome, WaitOutcome::BatteryLow(10.0));
        assert_eq!(mock.held_count(), 0);
    }
}
