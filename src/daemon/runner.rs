// src/daemon/runner.rs

//! The daemon loop: build, wait, repeat until the user quits.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::daemon::prompt::{ConsoleInput, Prompt};
use crate::daemon::session::{Session, SessionOptions};
use crate::daemon::wait::{WaitController, WaitOutcome};
use crate::errors::Result;
use crate::exec::BuildBackend;
use crate::watch::capability::NotifyCapability;

pub struct Daemon<B, I, P> {
    options: SessionOptions,
    backend: B,
    input: I,
    prompt: P,
}

impl<B: BuildBackend, I: ConsoleInput, P: Prompt> Daemon<B, I, P> {
    pub fn new(options: SessionOptions, backend: B, input: I, prompt: P) -> Self {
        Self {
            options,
            backend,
            input,
            prompt,
        }
    }

    /// Start a session and run build cycles until the prompt or `shutdown`
    /// asks to quit. The session is stopped and its ignore file removed on
    /// the way out, whatever the result.
    pub async fn run(
        self,
        capability: &dyn NotifyCapability,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let Daemon {
            options,
            mut backend,
            input,
            prompt,
        } = self;

        let mut session = Session::start(options, capability)?;
        let mut controller = WaitController::new(Arc::clone(session.state()), input, prompt);

        let result = drive(&mut backend, &mut controller, &mut shutdown).await;

        session.stop();
        session.cleanup();
        info!(job = %session.job(), "watch session ended");
        result
    }
}

async fn drive<B, I, P>(
    backend: &mut B,
    controller: &mut WaitController<I, P>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()>
where
    B: BuildBackend,
    I: ConsoleInput,
    P: Prompt,
{
    let mut cycle: u64 = 0;

    while !*shutdown.borrow() {
        cycle += 1;
        match backend.build().await {
            Ok(outcome) => debug!(cycle, ?outcome, "build cycle finished"),
            Err(err) => warn!(cycle, error = %err, "build could not be run"),
        }

        let outcome = tokio::select! {
            outcome = controller.wait_for_changes() => outcome?,
            _ = interrupted(shutdown) => {
                info!("interrupted; shutting down");
                WaitOutcome::Quit
            }
        };

        if outcome == WaitOutcome::Quit {
            break;
        }
    }

    Ok(())
}

/// Resolves once `shutdown` turns true. Never resolves if its sender is gone
/// without having signalled.
pub async fn interrupted(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Ctrl-C → `true` on the returned channel.
pub fn spawn_ctrl_c_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(true);
    });
    rx
}
