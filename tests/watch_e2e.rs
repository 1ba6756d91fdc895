use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use watchrun::resolve::{WatchSet, resolve_in};
use watchrun::watch::{ChangeSignal, spawn_debouncer, spawn_watcher};

type TestResult = Result<(), Box<dyn Error>>;

/// Real `notify` backend: a write to a watched file surfaces as one signal.
#[tokio::test]
async fn write_to_watched_file_produces_a_signal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("f.txt");
    std::fs::write(&file, "one\n")?;

    let watch_set: WatchSet = [file.clone()].into_iter().collect();

    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(&watch_set, raw_tx)?;

    let (changes_tx, mut changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let shutdown = CancellationToken::new();
    let debouncer = spawn_debouncer(raw_rx, changes_tx, shutdown.clone(), Duration::from_millis(100));

    // Give the backend a moment to arm before writing.
    sleep(Duration::from_millis(300)).await;
    std::fs::write(&file, "two\n")?;

    let signal = timeout(Duration::from_secs(5), changes_rx.recv())
        .await?
        .expect("a write to a watched file must produce a signal");
    assert_eq!(signal.path.file_name(), file.file_name());

    shutdown.cancel();
    debouncer.await?;
    Ok(())
}

/// With no file arguments the whole working directory is watched, so a write
/// to any file under it triggers.
#[tokio::test]
async fn directory_fallback_watches_everything_under_it() -> TestResult {
    let dir = tempfile::tempdir()?;

    let tokens: Vec<String> = ["echo", "hi"].iter().map(|s| s.to_string()).collect();
    let invocation = resolve_in(tokens, dir.path())?;
    assert_eq!(invocation.watch_set.paths(), &[dir.path().to_path_buf()]);

    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(&invocation.watch_set, raw_tx)?;

    let (changes_tx, mut changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let shutdown = CancellationToken::new();
    let debouncer = spawn_debouncer(raw_rx, changes_tx, shutdown.clone(), Duration::from_millis(100));

    sleep(Duration::from_millis(300)).await;
    let file = dir.path().join("anywhere.txt");
    std::fs::write(&file, "first\n")?;
    // A second write in case the backend reports the creation separately
    // from a data change.
    sleep(Duration::from_millis(150)).await;
    std::fs::write(&file, "second\n")?;

    let signal = timeout(Duration::from_secs(5), changes_rx.recv())
        .await?
        .expect("a write under the watched directory must produce a signal");
    assert_eq!(signal.path.file_name(), file.file_name());

    shutdown.cancel();
    debouncer.await?;
    Ok(())
}

#[tokio::test]
async fn watching_a_missing_path_is_a_setup_error() {
    let watch_set: WatchSet = [PathBuf::from("/definitely/not/a/real/path/watchrun")]
        .into_iter()
        .collect();

    let (raw_tx, _raw_rx) = mpsc::unbounded_channel();
    assert!(spawn_watcher(&watch_set, raw_tx).is_err());
}
