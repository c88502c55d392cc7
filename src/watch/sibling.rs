// src/watch/sibling.rs

//! Discovery of sibling jobs that start after this one.
//!
//! A second, non-recursive subscription on the working directory that only
//! looks at ignore files. When one appears, the primary watcher is paused,
//! the sibling's patterns are merged into the ignore set, and the primary
//! watcher is resumed.
//!
//! Patterns are never retracted when a sibling exits; the ignore set only
//! grows for the lifetime of the session.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::ignore::{job_of_ignore_file, read_ignore_file};
use crate::watch::state::WatchSession;

/// Latency of the sibling subscription; kept tight so a sibling's ignore
/// file is merged before its first build writes output.
pub const SIBLING_LATENCY: Duration = Duration::from_millis(100);

pub struct SiblingWatcher {
    root: PathBuf,
    inner: Option<RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SiblingWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiblingWatcher")
            .field("root", &self.root)
            .field("running", &self.inner.is_some())
            .finish()
    }
}

impl SiblingWatcher {
    pub fn start(session: Arc<WatchSession>, own_job: impl Into<String>) -> Result<Self> {
        let root = session.root().to_path_buf();
        let own_job = own_job.into();

        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    eprintln!("docwatch: sibling watch error: {err}");
                }
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        info!("sibling watcher started on {:?}", root);

        let task = tokio::spawn(run_event_loop(session, own_job, event_rx));

        Ok(Self {
            root,
            inner: Some(watcher),
            task: Some(task),
        })
    }

    /// Unsubscribe. Safe to call more than once; teardown errors are
    /// swallowed.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.inner.take() {
            if let Err(err) = watcher.unwatch(&self.root) {
                debug!(error = %err, "error while unwatching sibling root (ignored)");
            }
            info!("sibling watcher stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SiblingWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ignore files of other jobs that appeared or received content in `event`.
///
/// Content counts as appearance because creating a file and writing its
/// patterns are separate events; merging the same file twice is harmless.
pub fn sibling_files<'a>(
    event: &'a Event,
    root: &'a Path,
    own_job: &'a str,
) -> impl Iterator<Item = &'a PathBuf> + 'a {
    let paths: &[PathBuf] = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1..).unwrap_or(&[])
        }
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        // FSEvents and kqueue cannot tell rename sides apart.
        | EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => &event.paths,
        _ => &[],
    };

    paths.iter().filter(move |path| {
        path.parent() == Some(root)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(job_of_ignore_file)
                .is_some_and(|job| job != own_job)
    })
}

/// Merge one sibling ignore file into the session, bracketed by a pause of
/// the primary watcher. Returns how many patterns were new.
pub fn merge_sibling(session: &WatchSession, path: &Path) -> usize {
    session.pause();
    let added = match read_ignore_file(path) {
        Some(patterns) => session.merge_ignores(patterns),
        None => 0,
    };
    session.resume();

    if added > 0 {
        info!(file = ?path, added, "merged sibling ignore patterns");
    }
    added
}

async fn run_event_loop(
    session: Arc<WatchSession>,
    own_job: String,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) {
    let root = session.root().to_path_buf();
    let mut tick = tokio::time::interval(SIBLING_LATENCY);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => match maybe_event {
                Some(event) => pending.extend(sibling_files(&event, &root, &own_job).cloned()),
                None => break,
            },
            _ = tick.tick() => {
                for path in std::mem::take(&mut pending) {
                    merge_sibling(&session, &path);
                }
            }
        }
    }

    debug!("sibling watcher loop ended");
}
