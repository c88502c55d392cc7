// src/daemon/wait.rs

//! The wait between two build cycles.
//!
//! ```text
//! Waiting ──settled change──────────────▶ Resolved(Rerun)
//!    │
//!    └──user input──▶ Prompting ──rerun──▶ Resolved(Rerun)
//!                         └─────quit────▶ Terminated
//! ```
//!
//! The console read and the settle timer are raced with `tokio::select!`,
//! so whichever completes first wins and the other is dropped at a defined
//! suspension point. Nothing is interrupted from the outside.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::daemon::prompt::{ConsoleInput, Prompt, PromptOutcome};
use crate::errors::{DocwatchError, Result};
use crate::watch::path_utils::remove_within;
use crate::watch::state::WatchSession;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Build again.
    Rerun,
    /// The user asked to quit; the whole process should end.
    Quit,
}

enum Waiting {
    Settled,
    Prompting,
}

/// Aborts the settle timer when the wait ends, however it ends.
struct TimerGuard(JoinHandle<()>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct WaitController<I, P> {
    session: Arc<WatchSession>,
    input: I,
    prompt: P,
    input_open: bool,
}

impl<I, P> std::fmt::Debug for WaitController<I, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitController")
            .field("session", &self.session)
            .field("input_open", &self.input_open)
            .finish_non_exhaustive()
    }
}

impl<I: ConsoleInput, P: Prompt> WaitController<I, P> {
    pub fn new(session: Arc<WatchSession>, input: I, prompt: P) -> Self {
        Self {
            session,
            input,
            prompt,
            input_open: true,
        }
    }

    /// Block until a settled change occurs or the user resolves the prompt.
    ///
    /// On `Rerun`, mirrored copies of vanished files are removed from the
    /// tmp dir first.
    pub async fn wait_for_changes(&mut self) -> Result<WaitOutcome> {
        info!("waiting for file changes");
        let started = Instant::now();

        let (armed_tx, armed_rx) = oneshot::channel::<()>();
        let (fired_tx, mut fired_rx) = oneshot::channel::<()>();
        let timer = TimerGuard(tokio::spawn(settle_timer(
            Arc::clone(&self.session),
            started,
            armed_rx,
            fired_tx,
        )));

        // The timer polls only once we are registered as its target.
        let _ = armed_tx.send(());

        // Cleared if the timer goes away without firing.
        let mut timer_alive = true;

        let state = loop {
            if !self.input_open {
                if timer_alive && (&mut fired_rx).await.is_ok() {
                    break Waiting::Settled;
                }
                return Err(DocwatchError::Other(anyhow!(
                    "settle timer stopped and console input is closed; cannot detect changes"
                )));
            }

            tokio::select! {
                biased;

                fired = &mut fired_rx, if timer_alive => match fired {
                    Ok(()) => break Waiting::Settled,
                    Err(_) => {
                        warn!("settle timer stopped unexpectedly; waiting for console input only");
                        timer_alive = false;
                    }
                },

                line = self.input.read_line() => match line {
                    Ok(Some(_)) => break Waiting::Prompting,
                    Ok(None) => {
                        info!("console input closed; waiting for file changes only");
                        self.input_open = false;
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read console input; disabling prompt");
                        self.input_open = false;
                    }
                },
            }
        };

        match state {
            Waiting::Settled => info!("files have changed"),
            Waiting::Prompting => {
                drop(timer);
                debug!("user interrupted wait; entering prompt");

                match self.prompt.run(&mut self.input).await? {
                    PromptOutcome::Rerun => info!("rerun requested"),
                    PromptOutcome::Quit => {
                        info!("quit requested");
                        return Ok(WaitOutcome::Quit);
                    }
                }
            }
        }

        self.remove_vanished();
        Ok(WaitOutcome::Rerun)
    }

    /// Remove tmp-dir copies of files that vanished since the last cycle, so
    /// stale intermediates cannot hide errors. Only paths inside the tmp dir
    /// are ever touched.
    fn remove_vanished(&self) {
        let vanished = self.session.take_vanished();
        if vanished.is_empty() {
            return;
        }
        let removed = remove_within(self.session.tmp_dir(), &vanished);
        debug!(queued = vanished.len(), removed, "cleaned vanished files from tmp dir");
    }
}

/// Poll the settle condition every latency interval and fire once it holds.
async fn settle_timer(
    session: Arc<WatchSession>,
    started: Instant,
    armed: oneshot::Receiver<()>,
    fired: oneshot::Sender<()>,
) {
    if armed.await.is_err() {
        return;
    }

    let mut tick = tokio::time::interval(session.latency());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;
        if session.is_settled(started, Instant::now()) {
            let _ = fired.send(());
            return;
        }
    }
}
