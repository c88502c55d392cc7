// src/watch/capability.rs

//! Start-time check that filesystem notification is usable.

use notify::{Config, Event, RecommendedWatcher, Watcher};

use crate::errors::{DocwatchError, Result};

/// Confirms that a filesystem-notification mechanism is available.
///
/// Consulted once, before any ignore file is written or any subscription is
/// made.
pub trait NotifyCapability: Send + Sync {
    fn ensure_available(&self) -> Result<()>;
}

/// Probes the platform's recommended `notify` backend by constructing (and
/// immediately dropping) a watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyProbe;

impl NotifyCapability for NotifyProbe {
    fn ensure_available(&self) -> Result<()> {
        RecommendedWatcher::new(|_: notify::Result<Event>| {}, Config::default())
            .map(|watcher| {
                tracing::debug!(kind = ?RecommendedWatcher::kind(), "filesystem notification available");
                drop(watcher);
            })
            .map_err(|err| {
                DocwatchError::MissingCapability(format!(
                    "daemon mode requires filesystem notification: {err}"
                ))
            })
    }
}
