// src/watch/debounce.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::Event;
use notify::event::{EventKind, ModifyKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fixed window within which repeated write events collapse into one trigger.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// A single accepted file change, forwarded to the run loop.
///
/// The path is only used for the `--- Changed:` status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignal {
    pub path: PathBuf,
}

/// Write-event coalescing state.
///
/// One clock is shared across the whole watch set: a cascade of writes from
/// one logical edit (a compiler rewriting several outputs, an editor doing a
/// write-and-rename dance) collapses into a single trigger.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Accept an event observed at `now` unless it falls inside the window
    /// opened by the previously accepted one.
    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) if now.duration_since(last) < self.window => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }
}

/// Only content writes count as triggers; creation, removal, renames and
/// metadata changes are ignored.
pub fn is_write_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) => false,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Spawn the debouncer loop.
///
/// Consumes raw notify events from `raw_rx` and forwards accepted writes as
/// [`ChangeSignal`]s on `changes_tx`. The change channel has capacity 1 and
/// the send is awaited, so a consumer busy running a command exerts
/// backpressure here; signals are not buffered away.
///
/// The loop ends, emitting nothing further, when `shutdown` is cancelled or
/// either channel closes.
pub fn spawn_debouncer(
    mut raw_rx: mpsc::UnboundedReceiver<Event>,
    changes_tx: mpsc::Sender<ChangeSignal>,
    shutdown: CancellationToken,
    window: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(window);

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                ev = raw_rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
            };

            if !is_write_event(&event.kind) {
                continue;
            }
            let Some(path) = event.paths.into_iter().next() else {
                continue;
            };
            if !debouncer.accept(Instant::now()) {
                debug!("write to {:?} within debounce window, suppressed", path);
                continue;
            }

            let signal = ChangeSignal { path };
            tokio::select! {
                _ = shutdown.cancelled() => break,
                res = changes_tx.send(signal) => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("debouncer loop ended");
    })
}
