// tests/wait_controller.rs
//
// The wait loop against an in-memory session. Time is paused, so the settle
// timer advances instantly once every task is idle.

mod common;
use crate::common::{init_tracing, write};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use docwatch::daemon::{PromptOutcome, WaitController, WaitOutcome};
use docwatch::watch::{IgnoreSet, WatchSession};
use docwatch_test_utils::fakes::{ScriptedInput, ScriptedPrompt};

type TestResult = Result<(), Box<dyn Error>>;

const LATENCY: Duration = Duration::from_millis(500);

fn session_in(root: &Path) -> Arc<WatchSession> {
    session_with_latency(root, LATENCY)
}

fn session_with_latency(root: &Path, latency: Duration) -> Arc<WatchSession> {
    Arc::new(WatchSession::new(
        root,
        root.join("main_docwatchtmp"),
        latency,
        IgnoreSet::default(),
    ))
}

/// Touch the session `times` times, `every` apart, from another task.
fn touch_later(session: &Arc<WatchSession>, every: Duration, times: usize) {
    let session = Arc::clone(session);
    tokio::spawn(async move {
        for _ in 0..times {
            tokio::time::sleep(every).await;
            session.touch(Instant::now());
        }
    });
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_resolves_once_after_quiet_period() -> TestResult {
    init_tracing();
    let session = session_in(Path::new("/work"));
    let (input, _keys) = ScriptedInput::new();
    let mut controller = WaitController::new(Arc::clone(&session), input, ScriptedPrompt::default());

    let started = Instant::now();
    touch_later(&session, Duration::from_millis(150), 5);

    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Rerun);
    // Last change at 750ms, then twice the latency of silence.
    assert!(started.elapsed() >= Duration::from_millis(1750));

    let again = tokio::time::timeout(Duration::from_secs(30), controller.wait_for_changes()).await;
    assert!(again.is_err(), "an already consumed burst resolved a second wait");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn change_before_wait_started_is_not_pending() -> TestResult {
    let session = session_in(Path::new("/work"));
    session.touch(Instant::now());
    tokio::time::advance(Duration::from_secs(5)).await;

    let (input, _keys) = ScriptedInput::new();
    let mut controller = WaitController::new(session, input, ScriptedPrompt::default());

    let waited = tokio::time::timeout(Duration::from_secs(30), controller.wait_for_changes()).await;
    assert!(waited.is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn keypress_opens_prompt_and_its_answer_wins() -> TestResult {
    init_tracing();
    let session = session_in(Path::new("/work"));
    let (input, keys) = ScriptedInput::new();
    let prompt = ScriptedPrompt::new([PromptOutcome::Rerun, PromptOutcome::Quit]);
    let mut controller = WaitController::new(Arc::clone(&session), input, prompt.clone());

    keys.send(Some(String::new()))?;
    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Rerun);

    keys.send(Some("x".to_string()))?;
    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Quit);

    assert_eq!(prompt.times_entered(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_console_falls_back_to_file_changes() -> TestResult {
    let session = session_in(Path::new("/work"));
    let (input, keys) = ScriptedInput::new();
    let prompt = ScriptedPrompt::default();
    let mut controller = WaitController::new(Arc::clone(&session), input, prompt.clone());

    keys.send(None)?;
    touch_later(&session, Duration::from_millis(10), 1);

    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Rerun);
    assert_eq!(prompt.times_entered(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rerun_removes_vanished_copies_inside_tmp_dir_only() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    let tmp = root.join("main_docwatchtmp");
    std::fs::create_dir(&tmp)?;
    let stale = tmp.join("chapter.aux");
    let outside = root.join("chapter.tex");
    write(&stale, "stale");
    write(&outside, "source");

    let session = session_in(root);
    session.queue_vanished(stale.clone());
    session.queue_vanished(outside.clone());
    session.queue_vanished(tmp.join("..").join("chapter.tex"));
    session.queue_vanished(tmp.join("never-existed.aux"));

    let (input, _keys) = ScriptedInput::new();
    let mut controller = WaitController::new(Arc::clone(&session), input, ScriptedPrompt::default());
    touch_later(&session, Duration::from_millis(10), 1);

    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Rerun);
    assert!(!stale.exists());
    assert!(outside.exists());
    assert!(tmp.exists());
    assert!(session.take_vanished().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn quit_leaves_tmp_dir_untouched() -> TestResult {
    let dir = tempfile::tempdir()?;
    let tmp = dir.path().join("main_docwatchtmp");
    std::fs::create_dir(&tmp)?;
    let stale = tmp.join("chapter.aux");
    write(&stale, "stale");

    let session = session_in(dir.path());
    session.queue_vanished(stale.clone());

    let (input, keys) = ScriptedInput::new();
    let prompt = ScriptedPrompt::new([PromptOutcome::Quit]);
    let mut controller = WaitController::new(session, input, prompt);

    keys.send(Some(String::new()))?;
    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Quit);
    assert!(stale.exists());
    Ok(())
}

// A zero period makes `tokio::time::interval` panic inside the settle timer,
// so the timer task dies without ever firing.

#[tokio::test(start_paused = true)]
async fn dead_settle_timer_is_not_a_change() -> TestResult {
    let session = session_with_latency(Path::new("/work"), Duration::ZERO);
    let (input, keys) = ScriptedInput::new();
    let prompt = ScriptedPrompt::new([PromptOutcome::Rerun]);
    let mut controller = WaitController::new(Arc::clone(&session), input, prompt.clone());

    let waited = tokio::time::timeout(Duration::from_secs(30), controller.wait_for_changes()).await;
    assert!(waited.is_err(), "wait resolved although nothing changed");
    assert_eq!(session.last_change(), None);

    // The console still works.
    keys.send(Some(String::new()))?;
    assert_eq!(controller.wait_for_changes().await?, WaitOutcome::Rerun);
    assert_eq!(prompt.times_entered(), 1);
    Ok(())
}

#[tokio::test]
async fn dead_settle_timer_with_closed_console_is_an_error() -> TestResult {
    let session = session_with_latency(Path::new("/work"), Duration::ZERO);
    let (input, keys) = ScriptedInput::new();
    let prompt = ScriptedPrompt::default();
    let mut controller = WaitController::new(Arc::clone(&session), input, prompt.clone());

    keys.send(None)?;
    let result = tokio::time::timeout(Duration::from_secs(5), controller.wait_for_changes()).await?;

    assert!(result.is_err());
    assert_eq!(session.last_change(), None);
    assert_eq!(prompt.times_entered(), 0);
    Ok(())
}
