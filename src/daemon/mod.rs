// src/daemon/mod.rs

//! Daemon mode.
//!
//! This module ties together:
//! - the watch [`Session`] (ignore file, primary and sibling watchers)
//! - the [`WaitController`] that blocks between build cycles
//! - the console prompt collaborator
//! - the [`Daemon`] loop that alternates builds and waits

pub mod prompt;
pub mod runner;
pub mod session;
pub mod wait;

pub use prompt::{ConsoleInput, LinePrompt, Prompt, PromptOutcome, StdinInput};
pub use runner::{interrupted, spawn_ctrl_c_listener, Daemon};
pub use session::{Session, SessionOptions};
pub use wait::{WaitController, WaitOutcome};
