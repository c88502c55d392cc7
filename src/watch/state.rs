// src/watch/state.rs

//! Shared state of one watch session.
//!
//! Written by the watcher tasks, read by the wait loop. One `WatchSession`
//! is created per [`crate::daemon::Session`] and handed around as an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::watch::patterns::IgnoreSet;

pub struct WatchSession {
    root: PathBuf,
    tmp_dir: PathBuf,
    latency: Duration,
    ignore: RwLock<IgnoreSet>,
    last_change: Mutex<Option<Instant>>,
    vanished: Mutex<Vec<PathBuf>>,
    /// Pause depth of the primary watcher; delivery is suspended while > 0.
    paused: watch::Sender<usize>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("tmp_dir", &self.tmp_dir)
            .field("latency", &self.latency)
            .field("last_change", &self.last_change())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

impl WatchSession {
    pub fn new(
        root: impl Into<PathBuf>,
        tmp_dir: impl Into<PathBuf>,
        latency: Duration,
        ignore: IgnoreSet,
    ) -> Self {
        let (paused, _) = watch::channel(0);
        Self {
            root: root.into(),
            tmp_dir: tmp_dir.into(),
            latency,
            ignore: RwLock::new(ignore),
            last_change: Mutex::new(None),
            vanished: Mutex::new(Vec::new()),
            paused,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Read access to the ignore set, held for the evaluation of a whole
    /// event batch.
    pub fn ignore_set(&self) -> RwLockReadGuard<'_, IgnoreSet> {
        self.ignore.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.ignore_set().is_ignored(rel_path)
    }

    /// Union `patterns` into the ignore set. Returns how many were new.
    pub fn merge_ignores<I, S>(&self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = self.ignore.write().unwrap_or_else(PoisonError::into_inner);
        set.extend(patterns)
    }

    pub fn ignored_patterns(&self) -> Vec<String> {
        self.ignore_set().patterns().to_vec()
    }

    pub fn last_change(&self) -> Option<Instant> {
        *self.last_change.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a relevant change at `at`.
    pub fn touch(&self, at: Instant) {
        *self.last_change.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    pub fn queue_vanished(&self, path: PathBuf) {
        debug!(?path, "queued vanished file");
        self.vanished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    /// Drain the vanished-file queue.
    pub fn take_vanished(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.vanished.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether a wait that began at `wait_started` may resolve at `now`.
    pub fn is_settled(&self, wait_started: Instant, now: Instant) -> bool {
        settled(self.last_change(), wait_started, now, self.latency)
    }

    pub fn pause(&self) {
        self.paused.send_modify(|depth| *depth += 1);
    }

    pub fn resume(&self) {
        self.paused.send_modify(|depth| *depth = depth.saturating_sub(1));
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow() > 0
    }
}

/// Settle policy: a change counts once it happened after the wait began and
/// nothing else has happened for at least two latency intervals.
pub fn settled(
    last_change: Option<Instant>,
    wait_started: Instant,
    now: Instant,
    latency: Duration,
) -> bool {
    match last_change {
        Some(at) => at > wait_started && now.saturating_duration_since(at) >= latency * 2,
        None => false,
    }
}
