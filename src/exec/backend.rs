// src/exec/backend.rs

//! Pluggable build backend abstraction.
//!
//! The daemon loop talks to a `BuildBackend` instead of spawning processes
//! itself, so tests can count builds without running any.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;

use super::command::{run_build_command, BuildOutcome};

/// Trait abstracting how one build is performed.
pub trait BuildBackend: Send {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>>;
}

/// Production backend: runs a shell command in the working directory.
#[derive(Debug, Clone)]
pub struct ShellBuild {
    cmd: String,
    cwd: PathBuf,
}

impl ShellBuild {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }
}

impl BuildBackend for ShellBuild {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>> {
        Box::pin(async move { Ok(run_build_command(&self.cmd, &self.cwd).await?) })
    }
}
