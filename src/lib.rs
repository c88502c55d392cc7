// src/lib.rs

pub mod cli;
pub mod config;
pub mod daemon;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::resolve_params;
use crate::daemon::{spawn_ctrl_c_listener, Daemon, LinePrompt, SessionOptions, StdinInput};
use crate::exec::{BuildBackend, ShellBuild};
use crate::watch::NotifyProbe;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// Without daemon mode this runs the build once. With it, this wires together:
/// - the watch session (ignore file, primary + sibling watchers)
/// - the build → wait → build loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let params = resolve_params(&args)?;
    info!(
        job = %params.jobname,
        jobpath = ?params.jobpath,
        daemon = params.daemon,
        "docwatch starting"
    );

    let mut backend = ShellBuild::new(params.build.clone(), params.jobpath.clone());

    if !params.daemon {
        let outcome = backend.build().await?;
        return Ok(outcome.exit_code());
    }

    let shutdown = spawn_ctrl_c_listener();
    Daemon::new(
        SessionOptions::from(&params),
        backend,
        StdinInput::new(),
        LinePrompt,
    )
    .run(&NotifyProbe, shutdown)
    .await?;

    Ok(0)
}
