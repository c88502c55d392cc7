// src/daemon/session.rs

//! Lifecycle of one daemon-mode watch session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Params;
use crate::errors::Result;
use crate::watch::capability::NotifyCapability;
use crate::watch::ignore::IgnoreRegistry;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::IgnoreSet;
use crate::watch::sibling::SiblingWatcher;
use crate::watch::state::WatchSession;
use crate::watch::watcher::ChangeWatcher;

/// Everything a [`Session`] needs to start.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub job: String,
    pub jobpath: PathBuf,
    pub tmpdir: PathBuf,
    pub latency: Duration,
    /// Paths this job generates; advertised to sibling jobs.
    pub ignore: Vec<String>,
}

impl From<&Params> for SessionOptions {
    fn from(params: &Params) -> Self {
        Self {
            job: params.jobname.clone(),
            jobpath: params.jobpath.clone(),
            tmpdir: params.tmpdir.clone(),
            latency: params.listen_interval,
            ignore: params.ignore.clone(),
        }
    }
}

/// Owns the watch state and both watchers for one job.
#[derive(Debug)]
pub struct Session {
    job: String,
    ignore_file: PathBuf,
    state: Arc<WatchSession>,
    change: ChangeWatcher,
    sibling: SiblingWatcher,
}

impl Session {
    /// Start watching `options.jobpath`.
    ///
    /// Order matters:
    /// 1. confirm filesystem notification works (nothing is created otherwise)
    /// 2. persist this job's ignore file
    /// 3. start the primary watcher paused
    /// 4. start the sibling watcher, then scan for siblings already running,
    ///    so a sibling starting in between is seen by at least one of the two
    /// 5. resume the primary watcher
    pub fn start(options: SessionOptions, capability: &dyn NotifyCapability) -> Result<Self> {
        capability.ensure_available()?;

        let root = options.jobpath.canonicalize()?;
        let tmpdir = match options.tmpdir.canonicalize() {
            Ok(dir) => dir,
            Err(_) => match options.tmpdir.strip_prefix(&options.jobpath) {
                Ok(rel) => root.join(rel),
                Err(_) => options.tmpdir.clone(),
            },
        };

        let mut registry = IgnoreRegistry::new();
        for pattern in &options.ignore {
            registry.register(pattern.as_str());
        }
        if let Some(rel) = relative_str(&root, &tmpdir).filter(|r| !r.is_empty()) {
            registry.register(rel);
        }

        let ignore_file = registry.persist(&options.job, &root)?;

        let state = Arc::new(WatchSession::new(
            root.clone(),
            tmpdir,
            options.latency,
            IgnoreSet::new(registry.patterns()),
        ));

        // From here on, failure must not leave our ignore file behind.
        let started = Self::start_watchers(&options.job, &root, &registry, &state);
        match started {
            Ok((change, sibling)) => {
                info!(
                    job = %options.job,
                    root = ?root,
                    patterns = state.ignored_patterns().len(),
                    "watch session started"
                );
                Ok(Self {
                    job: options.job,
                    ignore_file,
                    state,
                    change,
                    sibling,
                })
            }
            Err(err) => {
                remove_ignore_file(&ignore_file);
                Err(err)
            }
        }
    }

    fn start_watchers(
        job: &str,
        root: &Path,
        registry: &IgnoreRegistry,
        state: &Arc<WatchSession>,
    ) -> Result<(ChangeWatcher, SiblingWatcher)> {
        state.pause();
        let change = ChangeWatcher::start(Arc::clone(state));
        let result = change.and_then(|change| {
            let sibling = SiblingWatcher::start(Arc::clone(state), job)?;
            for found in registry.discover_siblings(job, root)? {
                let added = state.merge_ignores(&found.patterns);
                info!(sibling = %found.job, added, "merged ignore patterns of running sibling");
            }
            Ok((change, sibling))
        });
        state.resume();
        result
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn ignore_file(&self) -> &Path {
        &self.ignore_file
    }

    pub fn state(&self) -> &Arc<WatchSession> {
        &self.state
    }

    /// Suspend change delivery until [`Session::resume`].
    pub fn pause(&self) {
        self.change.pause();
    }

    pub fn resume(&self) {
        self.change.resume();
    }

    /// Stop both watchers. Idempotent; never fails.
    pub fn stop(&mut self) {
        self.change.stop();
        self.sibling.stop();
    }

    /// Remove this job's ignore file. A missing file is fine.
    pub fn cleanup(&self) {
        remove_ignore_file(&self.ignore_file);
    }
}

fn remove_ignore_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(file = ?path, "removed ignore file"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => debug!(file = ?path, error = %err, "failed to remove ignore file (ignored)"),
    }
}
