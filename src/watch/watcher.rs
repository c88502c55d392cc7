// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::path_utils::{relative_str, vanished_target};
use crate::watch::state::WatchSession;

/// Filesystem events collected over one latency interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub added: BTreeSet<PathBuf>,
    pub modified: BTreeSet<PathBuf>,
    pub removed: BTreeSet<PathBuf>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Sort the paths of one notify event into added / modified / removed.
    ///
    /// Renames count as removal of the source and addition of the target.
    /// Access events are dropped.
    pub fn record(&mut self, event: &Event) {
        match event.kind {
            EventKind::Access(_) => {}
            EventKind::Create(_) => self.added.extend(event.paths.iter().cloned()),
            EventKind::Remove(_) => self.removed.extend(event.paths.iter().cloned()),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                self.removed.extend(event.paths.iter().cloned())
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                self.added.extend(event.paths.iter().cloned())
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.iter();
                if let Some(from) = paths.next() {
                    self.removed.insert(from.clone());
                }
                self.added.extend(paths.cloned());
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                // Backends that cannot tell the two sides of a rename apart.
                for path in &event.paths {
                    if path.exists() {
                        self.added.insert(path.clone());
                    } else {
                        self.removed.insert(path.clone());
                    }
                }
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                self.modified.extend(event.paths.iter().cloned())
            }
        }
    }
}

/// Evaluate one batch against the session's ignore set.
///
/// Any non-ignored path marks a change at `now`; every non-ignored removal is
/// queued as a vanished file in the tmp dir. Returns whether anything was
/// relevant.
pub fn apply_batch(session: &WatchSession, batch: &ChangeBatch, now: Instant) -> bool {
    let ignore = session.ignore_set();
    let root = session.root();

    let relevant = |path: &PathBuf| -> bool {
        match relative_str(root, path) {
            Some(rel) if rel.is_empty() => false,
            Some(rel) => {
                let ignored = ignore.is_ignored(&rel);
                debug!(rel = %rel, ignored, "evaluated change");
                !ignored
            }
            None => {
                warn!("could not relativize path {:?} against root {:?}", path, root);
                false
            }
        }
    };

    let mut changed = false;
    for path in batch.added.iter().chain(batch.modified.iter()) {
        changed |= relevant(path);
    }
    for path in &batch.removed {
        if relevant(path) {
            changed = true;
            session.queue_vanished(vanished_target(root, session.tmp_dir(), path));
        }
    }
    drop(ignore);

    if changed {
        session.touch(now);
    }
    changed
}

/// The primary watcher: observes the whole working directory and records
/// relevant changes in the [`WatchSession`].
///
/// Dropping it stops file watching.
pub struct ChangeWatcher {
    session: Arc<WatchSession>,
    inner: Option<RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("root", &self.session.root())
            .field("running", &self.inner.is_some())
            .finish()
    }
}

impl ChangeWatcher {
    /// Subscribe to events under `session.root()` recursively, delivering
    /// batches once per `session.latency()`.
    pub fn start(session: Arc<WatchSession>) -> Result<Self> {
        let root = session.root().to_path_buf();

        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // The receiver is gone once the watcher is stopped.
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    eprintln!("docwatch: file watch error: {err}");
                }
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", root);

        let task = tokio::spawn(run_event_loop(Arc::clone(&session), event_rx));

        Ok(Self {
            session,
            inner: Some(watcher),
            task: Some(task),
        })
    }

    /// Suspend batch delivery; events keep accumulating.
    pub fn pause(&self) {
        self.session.pause();
    }

    pub fn resume(&self) {
        self.session.resume();
    }

    /// Unsubscribe. Safe to call more than once; teardown errors are
    /// swallowed.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.inner.take() {
            if let Err(err) = watcher.unwatch(self.session.root()) {
                debug!(error = %err, "error while unwatching root (ignored)");
            }
            info!("file watcher stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_event_loop(session: Arc<WatchSession>, mut event_rx: mpsc::UnboundedReceiver<Event>) {
    let mut tick = tokio::time::interval(session.latency());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut batch = ChangeBatch::default();

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => match maybe_event {
                Some(event) => {
                    debug!(?event, "received notify event");
                    batch.record(&event);
                }
                None => break,
            },
            _ = tick.tick() => {
                if batch.is_empty() || session.is_paused() {
                    continue;
                }
                let ready = std::mem::take(&mut batch);
                apply_batch(&session, &ready, Instant::now());
            }
        }
    }

    debug!("file watcher loop ended");
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use notify::event::{CreateKind, DataChange, RemoveKind};

    use super::*;
    use crate::watch::patterns::IgnoreSet;

    fn session() -> WatchSession {
        WatchSession::new(
            "/work",
            "/work/tmp",
            Duration::from_millis(500),
            IgnoreSet::new(["out.pdf", "tmp"]),
        )
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut ev = Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn events_are_sorted_by_kind() {
        let mut batch = ChangeBatch::default();
        batch.record(&event(EventKind::Create(CreateKind::File), &["/work/a.tex"]));
        batch.record(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/work/b.tex"],
        ));
        batch.record(&event(EventKind::Remove(RemoveKind::File), &["/work/c.tex"]));
        batch.record(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/work/old.tex", "/work/new.tex"],
        ));
        batch.record(&event(EventKind::Access(notify::event::AccessKind::Any), &["/work/d.tex"]));

        assert!(batch.added.contains(Path::new("/work/a.tex")));
        assert!(batch.added.contains(Path::new("/work/new.tex")));
        assert!(batch.modified.contains(Path::new("/work/b.tex")));
        assert!(batch.removed.contains(Path::new("/work/c.tex")));
        assert!(batch.removed.contains(Path::new("/work/old.tex")));
        assert!(!batch.modified.contains(Path::new("/work/d.tex")));
    }

    #[test]
    fn ignored_paths_do_not_touch_the_timestamp() {
        let s = session();
        let mut batch = ChangeBatch::default();
        batch.modified.insert(PathBuf::from("/work/out.pdf"));
        batch.modified.insert(PathBuf::from("/work/.docwatchignore_aux"));
        batch.removed.insert(PathBuf::from("/work/tmp/main.aux"));

        assert!(!apply_batch(&s, &batch, Instant::now()));
        assert_eq!(s.last_change(), None);
        assert!(s.take_vanished().is_empty());
    }

    #[test]
    fn relevant_removal_is_mirrored_into_tmp_dir() {
        let s = session();
        let now = Instant::now();
        let mut batch = ChangeBatch::default();
        batch.removed.insert(PathBuf::from("/work/figs/plot.pdf"));
        batch.removed.insert(PathBuf::from("/work/out.pdf"));

        assert!(apply_batch(&s, &batch, now));
        assert_eq!(s.last_change(), Some(now));
        assert_eq!(s.take_vanished(), vec![PathBuf::from("/work/tmp/figs/plot.pdf")]);
    }

    #[test]
    fn paths_outside_root_are_not_relevant() {
        let s = session();
        let mut batch = ChangeBatch::default();
        batch.modified.insert(PathBuf::from("/elsewhere/x.tex"));
        batch.modified.insert(PathBuf::from("/work"));
        assert!(!apply_batch(&s, &batch, Instant::now()));
    }
}
