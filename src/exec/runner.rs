// src/exec/runner.rs

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::resolve::{CommandSpec, CommandStep};
use crate::watch::ChangeSignal;

/// How a single invocation of the command chain ended.
#[derive(Debug)]
pub enum RunEnd {
    /// The chain ran to its gated end (success or failure of the command
    /// itself; ordinary nonzero exits are not reported).
    Completed,
    /// A change arrived mid-run. The run was cancelled and the signal rides
    /// back to the caller so the rerun it owes is never skipped.
    Changed(ChangeSignal),
    /// The surrounding scope was cancelled or the change channel closed.
    Shutdown,
}

/// Outcome of one step of the chain.
enum StepEnd {
    Exited { success: bool },
    Changed(ChangeSignal),
    Shutdown,
}

/// Run the command chain once under a scope derived from `parent`.
///
/// Steps execute strictly in order; after each exit the step's gate decides
/// whether the chain continues (`&&` needs success, `||` needs failure).
/// Throughout the run the next [`ChangeSignal`] is raced against process
/// completion: if one arrives, the current process is asked to terminate,
/// its exit is still awaited, and the signal is returned inside
/// [`RunEnd::Changed`]. The change channel holds at most one pending signal,
/// so this hand-off loses nothing and duplicates nothing.
///
/// Only returns once the current child process has been reaped; no process
/// or task outlives the run.
pub async fn run_once(
    command: &CommandSpec,
    changes: &mut mpsc::Receiver<ChangeSignal>,
    parent: &CancellationToken,
) -> RunEnd {
    let scope = parent.child_token();

    eprintln!("--- Running: {command}");

    for step in &command.steps {
        match run_step(step, changes, &scope).await {
            StepEnd::Exited { success } => {
                if !step.gate.continues(success) {
                    debug!(
                        gate = ?step.gate,
                        success,
                        "gate halted the chain"
                    );
                    break;
                }
            }
            StepEnd::Changed(signal) => {
                scope.cancel();
                return RunEnd::Changed(signal);
            }
            StepEnd::Shutdown => return RunEnd::Shutdown,
        }
    }

    RunEnd::Completed
}

/// Run one step's process to completion, cancellation, or interruption by a
/// change signal.
async fn run_step(
    step: &CommandStep,
    changes: &mut mpsc::Receiver<ChangeSignal>,
    scope: &CancellationToken,
) -> StepEnd {
    debug!(argv = ?step.argv, "starting step process");

    let mut cmd = Command::new(&step.argv[0]);
    cmd.args(&step.argv[1..]).kill_on_drop(true);

    // stdout/stderr are inherited: the command's output is its own business.
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            // Launch failures are surfaced but never fatal to the watch
            // loop; the chain sees them as a failed step.
            eprintln!("watchrun: failed to start '{}': {err}", step.argv[0]);
            return StepEnd::Exited { success: false };
        }
    };

    // Either the process exits on its own (normal case), or a change signal
    // or scope cancellation terminates it early.
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                debug!(code = ?status.code(), "step process exited");
                StepEnd::Exited { success: status.success() }
            }
            Err(err) => {
                warn!(error = %err, "failed waiting for step process");
                StepEnd::Exited { success: false }
            }
        },
        signal = changes.recv() => match signal {
            Some(signal) => {
                eprintln!("--- Changed: {}", signal.path.display());
                terminate(&mut child).await;
                StepEnd::Changed(signal)
            }
            None => {
                // Change channel closed: structural shutdown.
                terminate(&mut child).await;
                StepEnd::Shutdown
            }
        },
        _ = scope.cancelled() => {
            terminate(&mut child).await;
            StepEnd::Shutdown
        }
    }
}

/// Ask the child to terminate and await its exit.
///
/// The exit is awaited even on the cancellation path, so a run is never
/// considered finished while its process lingers.
async fn terminate(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        // Usually a lost race with the process exiting on its own.
        debug!(error = %err, "failed to signal step process");
    }
    if let Err(err) = child.wait().await {
        warn!(error = %err, "failed to reap step process");
    }
}
