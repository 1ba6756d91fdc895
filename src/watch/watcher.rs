// src/watch/watcher.rs

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::SetupError;
use crate::resolve::WatchSet;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle closes the subscription.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Start a filesystem watcher over every entry of the [`WatchSet`].
///
/// Directories are watched recursively, plain files directly. Raw events are
/// forwarded from notify's synchronous callback into `raw_tx`; filtering and
/// debouncing happen downstream in [`debounce`](crate::watch::debounce).
///
/// Any failure here is a fatal setup error: the program never starts the
/// watch loop with a partial subscription.
pub fn spawn_watcher(
    watch_set: &WatchSet,
    raw_tx: mpsc::UnboundedSender<Event>,
) -> Result<WatcherHandle, SetupError> {
    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Receiver gone means we are shutting down; nothing to do.
                let _ = raw_tx.send(event);
            }
            Err(err) => {
                // We can't log via tracing here easily, so fallback to stderr.
                eprintln!("watchrun: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    for path in watch_set.paths() {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(path, mode)?;
        debug!("watching {:?} ({:?})", path, mode);
    }

    Ok(WatcherHandle { _inner: watcher })
}
