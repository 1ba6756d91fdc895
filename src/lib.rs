// src/lib.rs

pub mod cli;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod resolve;
pub mod watch;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::CliArgs;
use crate::engine::Coordinator;
use crate::watch::{ChangeSignal, DEBOUNCE_WINDOW};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - command-line resolution (watch set + command chain)
/// - the filesystem watcher and debouncer
/// - SIGINT/SIGTERM handling
/// - the run loop
///
/// Any failure before the loop starts is fatal; once the loop runs, the
/// only way out is a terminate signal (or the watcher going away).
pub async fn run(args: CliArgs) -> Result<()> {
    let invocation = resolve::resolve(args.command)?;

    // Root cancellable scope; every in-flight run derives from it.
    let root = CancellationToken::new();

    // Raw notify events funnel through an unbounded channel into the
    // debouncer; accepted writes come out as single change signals on a
    // one-slot channel read by the run loop.
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let _watcher = watch::spawn_watcher(&invocation.watch_set, raw_tx)?;

    let (changes_tx, changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let debouncer = watch::spawn_debouncer(raw_rx, changes_tx, root.clone(), DEBOUNCE_WINDOW);

    let signals = spawn_signal_listener(root.clone());

    let coordinator = Coordinator::new(invocation.command, changes_rx, root.clone());
    coordinator.run().await?;

    // The loop can also end because the watcher side closed; make the
    // cancellation explicit either way so the debouncer unblocks.
    root.cancel();
    debouncer.await?;
    signals.abort();
    let _ = signals.await;

    debug!("all background tasks joined");
    Ok(())
}

/// Turn SIGINT / SIGTERM into root-scope cancellation.
fn spawn_signal_listener(root: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut term = match signal(SignalKind::terminate()) {
                Ok(term) => term,
                Err(err) => {
                    eprintln!("watchrun: failed to listen for SIGTERM: {err}");
                    return;
                }
            };
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        eprintln!("watchrun: failed to listen for Ctrl+C: {err}");
                        return;
                    }
                }
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(err) = tokio::signal::ctrl_c().await {
                eprintln!("watchrun: failed to listen for Ctrl+C: {err}");
                return;
            }
        }

        debug!("terminate signal received");
        root.cancel();
    })
}
