use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use watchrun::engine::Coordinator;
use watchrun::resolve::{CommandSpec, CommandStep, Gate};
use watchrun::watch::ChangeSignal;

type TestResult = Result<(), Box<dyn Error>>;

/// Command that appends one line to `out` per run, so runs are countable.
fn appending_command(out: &Path, extra: &str) -> CommandSpec {
    CommandSpec {
        steps: vec![CommandStep {
            argv: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo run >> '{}'{extra}", out.display()),
            ],
            gate: Gate::None,
        }],
    }
}

fn count_lines(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

async fn wait_for_lines(path: &Path, want: usize) -> TestResult {
    let deadline = Instant::now() + Duration::from_secs(5);
    while count_lines(path) < want {
        if Instant::now() > deadline {
            return Err(format!(
                "timed out waiting for {want} lines in {path:?}, have {}",
                count_lines(path)
            )
            .into());
        }
        sleep(Duration::from_millis(20)).await;
    }
    Ok(())
}

#[tokio::test]
async fn signal_between_runs_triggers_exactly_one_rerun() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");

    let (changes_tx, changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let root = CancellationToken::new();
    let coordinator = Coordinator::new(appending_command(&out, ""), changes_rx, root.clone());
    let handle = tokio::spawn(coordinator.run());

    // Initial run happens with no trigger at all.
    wait_for_lines(&out, 1).await?;

    changes_tx
        .send(ChangeSignal {
            path: PathBuf::from("f.txt"),
        })
        .await?;
    wait_for_lines(&out, 2).await?;

    // One signal, one rerun: nothing further shows up.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(count_lines(&out), 2);

    root.cancel();
    timeout(Duration::from_secs(5), handle).await???;
    Ok(())
}

#[tokio::test]
async fn signal_during_a_run_cancels_it_and_reruns_once() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");

    // Each run records its start, then blocks long enough to be interrupted.
    let command = appending_command(&out, "; sleep 5");

    let (changes_tx, changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let root = CancellationToken::new();
    let coordinator = Coordinator::new(command, changes_rx, root.clone());

    let started = Instant::now();
    let handle = tokio::spawn(coordinator.run());

    wait_for_lines(&out, 1).await?;

    changes_tx
        .send(ChangeSignal {
            path: PathBuf::from("f.txt"),
        })
        .await?;

    // The rerun starts without waiting out the 5s sleep.
    wait_for_lines(&out, 2).await?;
    assert!(started.elapsed() < Duration::from_secs(4));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(count_lines(&out), 2, "one mid-run signal, one rerun");

    root.cancel();
    timeout(Duration::from_secs(5), handle).await???;
    assert!(started.elapsed() < Duration::from_secs(9));
    Ok(())
}

#[tokio::test]
async fn root_cancellation_mid_run_exits_without_rerunning() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");

    let command = appending_command(&out, "; sleep 5");

    let (_changes_tx, changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let root = CancellationToken::new();
    let coordinator = Coordinator::new(command, changes_rx, root.clone());

    let started = Instant::now();
    let handle = tokio::spawn(coordinator.run());

    wait_for_lines(&out, 1).await?;
    root.cancel();
    timeout(Duration::from_secs(5), handle).await???;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(count_lines(&out), 1, "no run may start after terminate");
    Ok(())
}

#[tokio::test]
async fn closed_change_channel_ends_the_loop() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");

    let (changes_tx, changes_rx) = mpsc::channel::<ChangeSignal>(1);
    let root = CancellationToken::new();
    let coordinator = Coordinator::new(appending_command(&out, ""), changes_rx, root);
    let handle = tokio::spawn(coordinator.run());

    wait_for_lines(&out, 1).await?;
    drop(changes_tx);

    timeout(Duration::from_secs(5), handle).await???;
    assert_eq!(count_lines(&out), 1);
    Ok(())
}
