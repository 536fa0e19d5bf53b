// src/supervisor/shutdown.rs

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::StopError;
use crate::exec::ManagedProcess;

const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Interrupt the agent, then race its exit against `cancel` and `timeout`.
pub(super) async fn terminate(
    mut process: ManagedProcess,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), StopError> {
    let pid = process.pid;
    match process.interrupt() {
        Ok(()) => debug!(pid, workdir = ?process.workdir, "sent interrupt to agent process"),
        Err(e) => warn!(pid, error = %e, "failed to interrupt agent process"),
    }

    let (kill_tx, kill_rx) = oneshot::channel::<()>();
    let mut waiter = tokio::spawn(wait_for_exit(process.child, kill_rx));

    let outcome = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            warn!(pid, "stop cancelled; killing agent process");
            let _ = kill_tx.send(());
            Err(StopError::Cancelled)
        }

        res = &mut waiter => classify_exit(pid, res),

        _ = tokio::time::sleep(timeout) => {
            warn!(
                pid,
                timeout_ms = timeout.as_millis() as u64,
                "agent did not exit after interrupt; killing"
            );
            let _ = kill_tx.send(());
            match waiter.await {
                Ok(Ok(status)) => debug!(pid, %status, "killed agent reaped"),
                Ok(Err(e)) => debug!(pid, error = %e, "error while reaping killed agent"),
                Err(e) => debug!(pid, error = %e, "agent wait task failed"),
            }
            Ok(())
        }
    };

    if !matches!(outcome, Err(StopError::Cancelled)) {
        drain_output(pid, process.pumps).await;
    }
    outcome
}

/// Give the output pumps a moment to forward what the agent wrote last.
async fn drain_output(pid: u32, pumps: Vec<JoinHandle<()>>) {
    for pump in pumps {
        if tokio::time::timeout(PUMP_DRAIN_TIMEOUT, pump).await.is_err() {
            debug!(pid, "agent output still open after exit; not waiting");
            return;
        }
    }
}

/// Owns the child until it exits. A message on `kill_rx`, or the sender
/// going away, turns a graceful wait into a forced kill.
async fn wait_for_exit(mut child: Child, kill_rx: oneshot::Receiver<()>) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        req = kill_rx => {
            if req.is_err() {
                debug!("stop abandoned before the agent exited; killing");
            }
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "failed to kill agent process");
            }
            child.wait().await
        }
    }
}

fn classify_exit(
    pid: u32,
    res: Result<io::Result<ExitStatus>, JoinError>,
) -> Result<(), StopError> {
    match res {
        Ok(Ok(status)) if status.success() || is_interrupt_exit(&status) => {
            info!(pid, %status, "agent process exited");
            Ok(())
        }
        Ok(Ok(status)) => Err(StopError::AgentExited { status }),
        Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {
            debug!(pid, "agent wait interrupted; treating as clean exit");
            Ok(())
        }
        Ok(Err(e)) => Err(StopError::Wait(Arc::new(e))),
        Err(join) => Err(StopError::Wait(Arc::new(io::Error::other(join)))),
    }
}

/// Whether `status` is the direct result of the interrupt sent by `stop`.
#[cfg(unix)]
fn is_interrupt_exit(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    status.signal() == Some(libc::SIGINT)
}

#[cfg(not(unix))]
fn is_interrupt_exit(_status: &ExitStatus) -> bool {
    // The interrupt is a kill on these platforms.
    true
}

/// Best-effort removal of the workspace; failures are only logged.
pub(super) fn remove_workspace(workspace: TempDir) {
    let path = workspace.path().to_path_buf();
    match workspace.close() {
        Ok(()) => debug!(workspace = ?path, "agent workspace removed"),
        Err(e) => warn!(workspace = ?path, error = %e, "failed to remove agent workspace"),
    }
}
