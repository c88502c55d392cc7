// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Naming, writing and reading ignore files shared between sibling jobs.
//! - Compiling the exclusion set (literal prefixes and globs).
//! - Wiring up the primary and sibling filesystem watchers (`notify`).
//! - Holding the state they share with the wait loop.
//!
//! It does **not** decide what to rebuild; it only records when relevant
//! files changed and which ones vanished.

pub mod capability;
pub mod ignore;
pub mod path_utils;
pub mod patterns;
pub mod sibling;
pub mod state;
pub mod watcher;

pub use capability::{NotifyCapability, NotifyProbe};
pub use ignore::{
    ignore_file_name, read_ignore_file, IgnoreRegistry, SiblingIgnoreFile, IGNORE_FILE_PREFIX,
};
pub use patterns::IgnoreSet;
pub use sibling::{SiblingWatcher, SIBLING_LATENCY};
pub use state::WatchSession;
pub use watcher::{ChangeBatch, ChangeWatcher};
