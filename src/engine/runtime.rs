// src/engine/runtime.rs

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::exec::{RunEnd, run_once};
use crate::resolve::CommandSpec;
use crate::watch::ChangeSignal;

/// The main run loop.
///
/// Runs the command once at startup, then again for every accepted change
/// signal, until the root scope is cancelled or the change channel closes.
///
/// A signal that interrupted a run comes back from [`run_once`] as
/// [`RunEnd::Changed`] and leads straight into the next run, so every
/// accepted signal causes exactly one rerun; none are dropped, none run
/// twice.
pub struct Coordinator {
    command: CommandSpec,
    changes_rx: mpsc::Receiver<ChangeSignal>,
    root: CancellationToken,
}

impl Coordinator {
    pub fn new(
        command: CommandSpec,
        changes_rx: mpsc::Receiver<ChangeSignal>,
        root: CancellationToken,
    ) -> Self {
        Self {
            command,
            changes_rx,
            root,
        }
    }

    /// Drive the run loop to completion.
    ///
    /// Returns once shutdown has been observed and the last in-flight run
    /// has fully exited.
    pub async fn run(mut self) -> Result<()> {
        info!("watchrun loop started");

        loop {
            let end = run_once(&self.command, &mut self.changes_rx, &self.root).await;

            match end {
                RunEnd::Shutdown => break,
                RunEnd::Changed(signal) => {
                    // The interrupting change already printed its status
                    // line; go straight into the rerun it triggered.
                    debug!(path = ?signal.path, "rerunning after mid-run change");
                }
                RunEnd::Completed => {
                    tokio::select! {
                        _ = self.root.cancelled() => break,
                        signal = self.changes_rx.recv() => match signal {
                            Some(signal) => {
                                eprintln!("--- Changed: {}", signal.path.display());
                            }
                            None => break,
                        },
                    }
                }
            }
        }

        info!("watchrun loop exiting");
        Ok(())
    }
}
