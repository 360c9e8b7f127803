//! Per-path event coalescing.
//!
//! One pending slot per file path: every new event for a path overwrites the
//! slot's kind and pushes its deadline out by the full window. A slot fires
//! exactly once when its deadline passes, carrying the most recent kind.
//! Pure state machine over `tokio::time::Instant`, so tests can drive it with
//! a paused clock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::{PersonaFileEvent, WatchEventKind};

#[derive(Debug)]
struct Pending {
    kind: WatchEventKind,
    deadline: Instant,
}

#[derive(Debug)]
pub(crate) struct DebounceQueue {
    window: Duration,
    pending: HashMap<PathBuf, Pending>,
}

impl DebounceQueue {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record an observation, restarting the path's quiet-period timer.
    pub(crate) fn record(&mut self, kind: WatchEventKind, path: PathBuf, now: Instant) {
        self.pending.insert(
            path,
            Pending {
                kind,
                deadline: now + self.window,
            },
        );
    }

    /// Earliest deadline among pending slots, if any.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Remove and return every slot whose deadline has passed, ordered by
    /// path for determinism.
    pub(crate) fn take_expired(&mut self, now: Instant) -> Vec<PersonaFileEvent> {
        let expired: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut events: Vec<PersonaFileEvent> = expired
            .into_iter()
            .filter_map(|path| {
                self.pending
                    .remove(&path)
                    .map(|p| PersonaFileEvent { kind: p.kind, path })
            })
            .collect();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        events
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
