// src/exec/mod.rs

//! Build execution layer.
//!
//! The build itself is an external collaborator: a shell command run once
//! per cycle with `tokio::process::Command`.
//!
//! - [`command`] runs the command and reports its [`BuildOutcome`].
//! - [`backend`] provides the `BuildBackend` trait and the production
//!   `ShellBuild`, which tests can replace with a fake implementation.

pub mod backend;
pub mod command;

pub use backend::{BuildBackend, ShellBuild};
pub use command::{run_build_command, BuildOutcome};
