//! Debounced directory watching.
//!
//! Raw `notify` events are forwarded from the backend's callback thread into
//! a channel, coalesced per path by a debounce loop, and delivered to the
//! single consumer as `PersonaFileEvent`s. Lifecycle: Idle → Starting →
//! Active; `stop` returns to Idle from anywhere and drops pending events
//! without flushing them.

mod debounce;

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{PersonaError, Result};
use crate::guard;
use crate::loader::PERSONA_EXTENSIONS;

use debounce::DebounceQueue;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Added,
    Changed,
    Removed,
}

/// One debounced change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaFileEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Starting,
    Active,
}

/// Watches persona directories and emits debounced per-path events.
pub struct PersonaWatcher {
    debounce: Duration,
    state: WatcherState,
    watched_dirs: Vec<PathBuf>,
    backend: Option<RecommendedWatcher>,
    debounce_task: Option<tokio::task::JoinHandle<()>>,
}

impl PersonaWatcher {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms.max(1)),
            state: WatcherState::Idle,
            watched_dirs: Vec::new(),
            backend: None,
            debounce_task: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.watched_dirs
    }

    /// Start watching `dirs`, returning the event channel.
    ///
    /// Never raises: missing directories are logged and skipped, and a
    /// backend that cannot be created or registered leaves the watcher Idle
    /// with a receiver that yields nothing. Starting while Active performs
    /// an implicit stop first.
    pub async fn start(&mut self, dirs: &[PathBuf]) -> mpsc::UnboundedReceiver<PersonaFileEvent> {
        if self.state == WatcherState::Active {
            self.stop();
        }
        self.state = WatcherState::Starting;

        let mut surviving = Vec::new();
        for dir in dirs {
            match tokio::fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => surviving.push(dir.clone()),
                Ok(_) => warn!(dir = %dir.display(), "watch target is not a directory, skipping"),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "watch directory missing, skipping");
                }
            }
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        if surviving.is_empty() {
            warn!("no watchable directories, watcher stays idle");
            self.state = WatcherState::Idle;
            return out_rx;
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut backend = match notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Forwarded from notify's callback thread; the debounce loop owns
            // all interpretation.
            let _ = raw_tx.send(res);
        }) {
            Ok(backend) => backend,
            Err(e) => {
                warn!(error = %e, "watch backend unavailable, watcher stays idle");
                self.state = WatcherState::Idle;
                return out_rx;
            }
        };

        let mut registered = Vec::new();
        for dir in &surviving {
            match backend.watch(dir, RecursiveMode::Recursive) {
                Ok(()) => registered.push(dir.clone()),
                Err(e) => warn!(dir = %dir.display(), error = %e, "failed to register watch"),
            }
        }
        if registered.is_empty() {
            warn!("watch registration failed for every directory, watcher stays idle");
            self.state = WatcherState::Idle;
            return out_rx;
        }

        let window = self.debounce;
        self.debounce_task = Some(tokio::spawn(run_debounce_loop(raw_rx, out_tx, window)));
        self.backend = Some(backend);
        self.watched_dirs = registered;
        self.state = WatcherState::Active;
        info!(dirs = self.watched_dirs.len(), "persona watcher active");
        out_rx
    }

    /// Stop watching. Pending debounce slots are dropped, not flushed.
    /// Idempotent; safe from any state.
    pub fn stop(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
        self.backend = None;
        if !self.watched_dirs.is_empty() {
            info!("persona watcher stopped");
        }
        self.watched_dirs.clear();
        self.state = WatcherState::Idle;
    }

    /// Add a directory to the active watch set.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::Lifecycle` when the watcher is not Active — the
    /// one synchronously-raised error in this subsystem. Directory access
    /// failures are logged, not raised.
    pub async fn add_directory(&mut self, dir: &Path) -> Result<()> {
        if self.state != WatcherState::Active {
            return Err(PersonaError::Lifecycle(format!(
                "cannot add directory {}: watcher is not active",
                dir.display()
            )));
        }

        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                warn!(dir = %dir.display(), "add_directory target is not a directory, ignoring");
                return Ok(());
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "add_directory target inaccessible, ignoring");
                return Ok(());
            }
        }

        if let Some(backend) = self.backend.as_mut() {
            match backend.watch(dir, RecursiveMode::Recursive) {
                Ok(()) => {
                    if !self.watched_dirs.iter().any(|d| d == dir) {
                        self.watched_dirs.push(dir.to_path_buf());
                    }
                    debug!(dir = %dir.display(), "directory added to watch set");
                }
                Err(e) => warn!(dir = %dir.display(), error = %e, "failed to add watch"),
            }
        }
        Ok(())
    }

    /// Remove a directory from the active watch set. No-op when absent.
    pub fn remove_directory(&mut self, dir: &Path) {
        if let Some(backend) = self.backend.as_mut()
            && let Err(e) = backend.unwatch(dir)
        {
            debug!(dir = %dir.display(), error = %e, "unwatch failed");
        }
        self.watched_dirs.retain(|d| d != dir);
    }
}

impl Drop for PersonaWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_debounce_loop(
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    out_tx: mpsc::UnboundedSender<PersonaFileEvent>,
    window: Duration,
) {
    let mut queue = DebounceQueue::new(window);
    loop {
        match queue.next_deadline() {
            Some(deadline) => {
                tokio::select! {
                    maybe = raw_rx.recv() => match maybe {
                        Some(res) => absorb(res, &mut queue),
                        None => break,
                    },
                    () = tokio::time::sleep_until(deadline) => {
                        for event in queue.take_expired(Instant::now()) {
                            if out_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
            None => match raw_rx.recv().await {
                Some(res) => absorb(res, &mut queue),
                None => break,
            },
        }
    }
}

fn absorb(res: notify::Result<Event>, queue: &mut DebounceQueue) {
    match res {
        Ok(event) => {
            let now = Instant::now();
            for (kind, path) in classify(event) {
                queue.record(kind, path, now);
            }
        }
        Err(e) => warn!(error = %e, "watch backend error"),
    }
}

/// Map one raw backend event onto per-path persona events.
///
/// Renames are split by direction: the source path is a removal and the
/// destination an addition, so a file renamed out of scope does not linger
/// as a stale entry. Hidden files are excluded here but not in discovery —
/// an asymmetry the original exhibits, carried over unchanged.
fn classify(event: Event) -> Vec<(WatchEventKind, PathBuf)> {
    let kind = match event.kind {
        EventKind::Create(_) => WatchEventKind::Added,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => WatchEventKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchEventKind::Added,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // Paired rename: paths are [source, destination].
            return event
                .paths
                .into_iter()
                .enumerate()
                .map(|(i, path)| {
                    let kind = if i == 0 {
                        WatchEventKind::Removed
                    } else {
                        WatchEventKind::Added
                    };
                    (kind, path)
                })
                .filter(|(_, path)| is_watchable(path))
                .collect();
        }
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => WatchEventKind::Changed,
        EventKind::Remove(_) => WatchEventKind::Removed,
        EventKind::Access(_) => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter(|path| is_watchable(path))
        .map(|path| (kind, path))
        .collect()
}

fn is_watchable(path: &Path) -> bool {
    guard::has_allowed_extension(path, PERSONA_EXTENSIONS) && !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
