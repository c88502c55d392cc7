// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

/// Result of one build process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(i32), // exit code
}

impl BuildOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            BuildOutcome::Success => 0,
            BuildOutcome::Failed(code) => code,
        }
    }
}

/// Run `cmd` through the platform shell in `cwd`, with stdout/stderr passed
/// through to the terminal, and wait for it to exit.
pub async fn run_build_command(cmd: &str, cwd: &Path) -> Result<BuildOutcome> {
    info!(cmd = %cmd, "starting build");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let status = command
        .status()
        .await
        .with_context(|| format!("running build command '{cmd}'"))?;

    let code = status.code().unwrap_or(-1);
    let outcome = if status.success() {
        BuildOutcome::Success
    } else {
        BuildOutcome::Failed(code)
    };

    if status.success() {
        info!(exit_code = code, "build finished");
    } else {
        warn!(exit_code = code, "build failed");
    }

    Ok(outcome)
}
