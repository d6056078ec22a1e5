//! End-to-end properties of one keep-awake session, driven through the
//! mock platform. Interrupts are injected by cancelling the session's
//! interrupt token instead of raising real signals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use wakeguard::platform::mock::{MockBattery, MockPower};
use wakeguard::{session, AssertionKind, ChildCommand, Config, Platform, WaitOutcome, WakeError};

/// Sessions share a process-wide guard; serialize the tests that enter one.
static SESSION_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn config() -> Config {
    Config {
        kinds: vec![
            AssertionKind::PreventUserIdleSystemSleep,
            AssertionKind::PreventUserIdleDisplaySleep,
        ],
        ..Config::default()
    }
}

fn sh(script: &str) -> ChildCommand {
    ChildCommand::new("sh", vec!["-c".into(), script.into()])
}

#[tokio::test]
async fn timeout_resolves_after_the_configured_duration() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        timeout: Duration::from_millis(200),
        ..config()
    };
    cfg.validate().unwrap();

    let started = Instant::now();
    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
    assert_eq!(mock.held_count(), 0);
    assert_eq!(mock.acquired_total(), 2);
}

#[tokio::test]
async fn child_exit_code_is_the_outcome() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        child: Some(sh("exit 3")),
        ..config()
    };
    cfg.validate().unwrap();

    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, WaitOutcome::ChildExited(3));
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn timeout_beats_a_longer_running_child() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        timeout: Duration::from_millis(200),
        child: Some(sh("sleep 60")),
        grace: Duration::from_millis(300),
        ..config()
    };
    cfg.validate().unwrap();

    let started = Instant::now();
    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome, WaitOutcome::TimedOut);
    // The child was terminated inside the grace window, not waited on for 60 s.
    assert!(elapsed < Duration::from_secs(10), "elapsed {elapsed:?}");
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn interrupt_right_after_arming_wins_and_releases_afterwards() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        timeout: Duration::from_secs(300),
        ..config()
    };
    cfg.validate().unwrap();

    let interrupt = CancellationToken::new();
    interrupt.cancel();

    let outcome = session::run_with_interrupt(&cfg, &platform, interrupt)
        .await
        .unwrap();

    assert_eq!(outcome, WaitOutcome::Interrupted);
    // Release happened, and only after the full set had been acquired.
    assert_eq!(mock.acquired_total(), 2);
    assert_eq!(mock.released_total(), 2);
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn near_simultaneous_events_yield_exactly_one_outcome() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    // Timer and child race at the same instant.
    let cfg = Config {
        timeout: Duration::from_millis(50),
        child: Some(sh("sleep 0.05")),
        grace: Duration::from_millis(300),
        ..config()
    };
    cfg.validate().unwrap();

    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();

    assert!(
        matches!(outcome, WaitOutcome::TimedOut | WaitOutcome::ChildExited(_)),
        "unexpected outcome {outcome:?}"
    );
    assert_eq!(mock.held_count(), 0);
    assert_eq!(mock.released_total(), mock.acquired_total());
}

#[tokio::test]
async fn spawn_failure_rolls_back_every_assertion() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        child: Some(ChildCommand::new("wakeguard-no-such-binary", vec![])),
        ..config()
    };
    cfg.validate().unwrap();

    let err = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WakeError::Spawn(_)));
    assert_eq!(mock.acquired_total(), 2);
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn acquisition_failure_leaves_nothing_held() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    mock.fail_on(AssertionKind::PreventUserIdleDisplaySleep);
    let platform = Platform::new(mock.clone());

    let cfg = config();
    cfg.validate().unwrap();

    let err = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WakeError::Platform(_)));
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn battery_threshold_ends_the_session() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let battery = Arc::new(MockBattery::at(12.5));
    let platform = Platform::new(mock.clone()).with_battery(battery);

    let cfg = Config {
        min_battery: Some(20.0),
        battery_poll: Duration::from_millis(50),
        ..config()
    };
    cfg.validate().unwrap();

    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, WaitOutcome::BatteryLow(12.5));
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn battery_draining_below_threshold_ends_a_healthy_session() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let battery = Arc::new(MockBattery::at(80.0));
    let platform = Platform::new(mock.clone()).with_battery(battery.clone());

    let cfg = Config {
        timeout: Duration::from_secs(300),
        min_battery: Some(20.0),
        battery_poll: Duration::from_millis(50),
        ..config()
    };
    cfg.validate().unwrap();

    let session = tokio::spawn({
        let cfg = cfg.clone();
        let platform = platform.clone();
        async move { session::run_with_interrupt(&cfg, &platform, CancellationToken::new()).await }
    });

    // A few polls at healthy capacity keep the session running.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!session.is_finished());

    battery.set(15.0);
    let outcome = session.await.unwrap().unwrap();
    assert_eq!(outcome, WaitOutcome::BatteryLow(15.0));
    assert_eq!(mock.held_count(), 0);
}

#[tokio::test]
async fn overlapping_sessions_are_rejected_but_sequential_ones_work() {
    let _lock = SESSION_LOCK.lock().await;
    let mock = Arc::new(MockPower::new());
    let platform = Platform::new(mock.clone());

    let cfg = Config {
        timeout: Duration::from_secs(300),
        ..config()
    };
    cfg.validate().unwrap();

    let interrupt = CancellationToken::new();
    let first = tokio::spawn({
        let cfg = cfg.clone();
        let platform = platform.clone();
        let interrupt = interrupt.clone();
        async move { session::run_with_interrupt(&cfg, &platform, interrupt).await }
    });

    // Let the first session arm, then try to start a second one.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = session::run_with_interrupt(&cfg, &platform, CancellationToken::new()).await;
    assert!(matches!(second, Err(WakeError::AlreadyRunning)));

    interrupt.cancel();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, WaitOutcome::Interrupted);

    // The guard cleared; a fresh session runs fine.
    let cfg = Config {
        timeout: Duration::from_millis(50),
        ..config()
    };
    let outcome = session::run_with_interrupt(&cfg, &platform, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(mock.held_count(), 0);
}
