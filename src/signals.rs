//! External interrupt listening.
//!
//! The interrupt listener turns OS termination signals into a one-shot
//! [`CancellationToken`]. The waiter honors at most one interrupt per
//! invocation; signals arriving during teardown find the resolution latch
//! already committed and are ignored.
//!
//! ## Signals
//! **Unix:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal)
//!
//! [`tokio::signal::ctrl_c`] is awaited as a fallback.
//!
//! **Non-Unix:** only `Ctrl-C`.

use tokio_util::sync::CancellationToken;

/// Spawns the interrupt listener and returns its one-shot token.
///
/// The token is cancelled on the first termination signal. If signal
/// registration itself fails, the token is left alone: a broken listener
/// must not look like an operator interrupt, and the session keeps
/// waiting on its remaining watchers.
pub fn spawn_interrupt_listener() -> CancellationToken {
    let token = CancellationToken::new();
    let fired = token.clone();
    tokio::spawn(async move {
        settle(wait_for_interrupt().await, &fired);
    });
    token
}

/// Commits the listener's result to the token. Only a real signal cancels.
fn settle(result: std::io::Result<()>, fired: &CancellationToken) {
    match result {
        Ok(()) => {
            log::info!("interrupt received");
            fired.cancel();
        }
        Err(err) => {
            log::warn!("signal registration failed, interrupts disabled: {err}");
        }
    }
}

/// Waits for a termination signal. Each call registers independent listeners.
#[cfg(unix)]
async fn wait_for_interrupt() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal. Each call registers independent listeners.
#[cfg(not(unix))]
async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_received_signal_cancels_the_token() {
        let token = CancellationToken::new();
        settle(Ok(()), &token);
        assert!(token.is_cancelled());
    }

    #[test]
    fn registration_failure_does_not_fake_an_interrupt() {
        let token = CancellationToken::new();
        settle(
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no handler")),
            &token,
        );
        assert!(!token.is_cancelled());
    }
}
