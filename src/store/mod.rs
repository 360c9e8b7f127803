//! In-memory persona store.
//!
//! Entries are keyed by the composite (id, tier, file path), so the same id
//! may coexist across tiers and across files; the resolver reconciles those
//! at read time. The store itself only enforces key uniqueness.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{LoadedPersona, SourceTier};

/// Placeholder path segment for code-defined records.
const DEFAULT_PATH_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub id: String,
    pub tier: SourceTier,
    pub path: String,
}

impl StoreKey {
    pub fn for_record(record: &LoadedPersona) -> Self {
        Self {
            id: record.id().to_string(),
            tier: record.source.tier,
            path: record
                .source
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| DEFAULT_PATH_KEY.to_string()),
        }
    }
}

/// Map of composite key to loaded record. Insertion order is irrelevant.
#[derive(Debug, Default)]
pub struct PersonaStore {
    entries: HashMap<StoreKey, LoadedPersona>,
}

impl PersonaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any existing entry under the same key.
    /// Returns the displaced record if one existed.
    pub fn insert(&mut self, record: LoadedPersona) -> Option<LoadedPersona> {
        self.entries.insert(StoreKey::for_record(&record), record)
    }

    /// Remove every entry backed by `path`.
    ///
    /// Used on change events before re-insertion (covers id renames: the new
    /// record may land under a different key) and on unlink events. Returns
    /// the removed records; empty when the path was not present.
    pub fn remove_by_path(&mut self, path: &Path) -> Vec<LoadedPersona> {
        let keys: Vec<StoreKey> = self
            .entries
            .iter()
            .filter(|(_, record)| record.source.file_path.as_deref() == Some(path))
            .map(|(key, _)| key.clone())
            .collect();
        keys.into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }

    /// Remove the code-defined entry for `id`, if present.
    pub fn remove_default(&mut self, id: &str) -> Option<LoadedPersona> {
        let key = StoreKey {
            id: id.to_string(),
            tier: SourceTier::Default,
            path: DEFAULT_PATH_KEY.to_string(),
        };
        self.entries.remove(&key)
    }

    pub fn records(&self) -> Vec<LoadedPersona> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
