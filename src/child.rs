//! Supervision of the optional subordinate command.
//!
//! [`ChildSupervisor::launch`] spawns the child and a monitor task that owns
//! it. The monitor reports natural exit through the waiter's event channel;
//! if asked to terminate instead, it escalates SIGTERM → grace period →
//! SIGKILL and always finishes within a bound, so the core can never hang
//! on an unresponsive child.
//!
//! ```text
//! launch() ──► tokio child (kill_on_drop)
//!      └─► monitor task:
//!            select! {
//!                status = child.wait() ──► events.try_send(ChildExited)
//!                stop cancelled        ──► SIGTERM ─ grace ─ SIGKILL
//!            }
//! ```

use std::process::ExitStatus;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::ChildCommand;
use crate::error::SpawnError;
use crate::waiter::WaitEvent;

/// Maps an OS exit status to a single exit code.
///
/// Signal-terminated children map to `128 + signal` (shell convention), the
/// distinguished value for abnormal termination.
pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Launches and monitors one subordinate command.
#[derive(Debug)]
pub struct ChildSupervisor {
    program: String,
    stop: CancellationToken,
    monitor: JoinHandle<()>,
}

impl ChildSupervisor {
    /// Starts the command and its monitor task.
    ///
    /// Natural exit is reported as [`WaitEvent::ChildExited`] on `events`.
    ///
    /// # Errors
    /// [`SpawnError`] if the executable cannot be found or started. The
    /// caller treats this as fatal and rolls back before returning.
    pub fn launch(
        cmd: &ChildCommand,
        grace: Duration,
        events: mpsc::Sender<WaitEvent>,
    ) -> Result<Self, SpawnError> {
        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError {
                program: cmd.program.clone(),
                source,
            })?;

        info!("supervising '{}' (pid {:?})", cmd.program, child.id());

        let stop = CancellationToken::new();
        let monitor = tokio::spawn(monitor(child, stop.clone(), grace, events));

        Ok(Self {
            program: cmd.program.clone(),
            stop,
            monitor,
        })
    }

    /// Best-effort request to stop the child.
    ///
    /// Idempotent. The monitor escalates SIGTERM → grace → SIGKILL and
    /// proceeds even if the child never responds.
    pub fn terminate(&self) {
        debug!("terminate requested for '{}'", self.program);
        self.stop.cancel();
    }

    /// Waits for the monitor to finish, bounded by `bound`.
    ///
    /// If the bound is exceeded the monitor is aborted; `kill_on_drop`
    /// guarantees the child does not outlive it.
    pub async fn wait_stopped(self, bound: Duration) {
        if time::timeout(bound, self.monitor).await.is_err() {
            warn!("child monitor for '{}' exceeded its bound", self.program);
        }
    }
}

async fn monitor(
    mut child: Child,
    stop: CancellationToken,
    grace: Duration,
    events: mpsc::Sender<WaitEvent>,
) {
    // Handlers only pick a branch; the child is touched again only after
    // the select expression has dropped its borrowing futures.
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = stop.cancelled() => None,
    };

    match exited {
        Some(status) => {
            let event = match status {
                Ok(status) => {
                    let code = exit_code_of(status);
                    debug!("child exited with code {code}");
                    WaitEvent::ChildExited(code)
                }
                Err(err) => WaitEvent::Fault(format!("waiting on child failed: {err}")),
            };
            // The waiter may already have resolved; a dropped event is fine.
            let _ = events.try_send(event);
        }
        None => shut_down(&mut child, grace).await,
    }
}

/// SIGTERM, then up to `grace`, then SIGKILL. Never blocks past the grace.
async fn shut_down(child: &mut Child, grace: Duration) {
    request_termination(child);
    // Bound separately so the timeout future's borrow ends before the arms.
    let waited = time::timeout(grace, child.wait()).await;
    match waited {
        Ok(Ok(status)) => {
            debug!("child stopped within grace (code {})", exit_code_of(status));
        }
        Ok(Err(err)) => {
            warn!("waiting on terminating child failed: {err}");
        }
        Err(_) => {
            warn!("child ignored termination for {grace:?}; killing");
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &Child) {
    match child.id() {
        // SAFETY: plain kill(2) on a pid we own; failure is reported by errno
        // and is fine to ignore (the process may already be gone).
        Some(pid) => unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        },
        None => {}
    }
}

#[cfg(not(unix))]
fn request_termination(child: &Child) {
    // No graceful signal on this platform; the grace wait still applies
    // before the hard kill, which start_kill already is.
    let _ = child.id();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_child_exit_code() {
        let (tx, mut rx) = mpsc::channel(4);
        let cmd = ChildCommand::new("sh", vec!["-c".into(), "exit 3".into()]);
        let sup = ChildSupervisor::launch(&cmd, Duration::from_secs(1), tx).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, WaitEvent::ChildExited(3));
        sup.wait_stopped(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn spawn_failure_is_surfaced() {
        let (tx, _rx) = mpsc::channel(4);
        let cmd = ChildCommand::new("wakeguard-test-definitely-missing", vec![]);
        let err = ChildSupervisor::launch(&cmd, Duration::from_secs(1), tx).unwrap_err();
        assert_eq!(err.program, "wakeguard-test-definitely-missing");
    }

    #[tokio::test]
    async fn terminate_stops_a_long_running_child() {
        let (tx, _rx) = mpsc::channel(4);
        let cmd = ChildCommand::new("sh", vec!["-c".into(), "sleep 60".into()]);
        let sup = ChildSupervisor::launch(&cmd, Duration::from_millis(500), tx).unwrap();

        sup.terminate();
        // Must come back well within the grace, not after 60 s.
        sup.wait_stopped(Duration::from_secs(5)).await;
    }
}
