//! Orchestrator: owns the store, runs bulk loads, applies watch events, and
//! exposes the read API collaborators consume.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::PersonaConfig;
use crate::domain::{LoadedPersona, PersonaRecord, PersonaSource, SourceTier, builtin_personas};
use crate::error::Result;
use crate::loader::{LoadBudget, PersonaLoader};
use crate::resolver;
use crate::store::PersonaStore;
use crate::watcher::{PersonaFileEvent, PersonaWatcher, WatchEventKind};

/// One id with contributions from more than one source. `sources` is ordered
/// winner first, then shadowed tiers by descending precedence.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictInfo {
    pub id: String,
    pub sources: Vec<SourceTier>,
}

/// One record that failed to load, with its human-readable errors.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidInfo {
    pub id: String,
    pub path: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Diagnostic snapshot returned by `get_info`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaInfo {
    pub statistics: resolver::ResolverStats,
    pub conflicts: Vec<ConflictInfo>,
    pub invalid: Vec<InvalidInfo>,
    pub warnings: Vec<String>,
}

/// Manages the layered persona collection: initial load, live reload, and
/// precedence-resolved reads.
pub struct PersonaManager {
    config: PersonaConfig,
    loader: PersonaLoader,
    store: Arc<RwLock<PersonaStore>>,
    watcher: PersonaWatcher,
    consumer: Option<tokio::task::JoinHandle<()>>,
    user_dir: PathBuf,
    project_dir: PathBuf,
    initialized: bool,
}

impl PersonaManager {
    pub fn new(config: PersonaConfig) -> Self {
        let loader = PersonaLoader::new(config.resource_limits());
        let watcher = PersonaWatcher::new(config.watch.debounce_ms);
        let user_dir = config.directories.user.clone();
        let project_dir = config.directories.project.clone();
        Self {
            config,
            loader,
            store: Arc::new(RwLock::new(PersonaStore::new())),
            watcher,
            consumer: None,
            user_dir,
            project_dir,
            initialized: false,
        }
    }

    /// One-shot setup: ensure the user directory exists (best effort), run
    /// the full load, and start watching when enabled. Idempotent.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            debug!("manager already initialized");
            return Ok(());
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.user_dir).await {
            warn!(dir = %self.user_dir.display(), error = %e, "could not create user persona directory");
        }

        // Canonical roots make watch-event prefix classification reliable;
        // fall back to the configured paths when a root does not exist yet.
        self.user_dir = canonical_or_configured(&self.user_dir).await;
        self.project_dir = canonical_or_configured(&self.project_dir).await;

        self.full_load().await;

        if self.config.watch.enabled {
            let dirs = [self.user_dir.clone(), self.project_dir.clone()];
            let mut events = self.watcher.start(&dirs).await;

            let store = Arc::clone(&self.store);
            let loader = self.loader.clone();
            let user_dir = self.user_dir.clone();
            let project_dir = self.project_dir.clone();
            self.consumer = Some(tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    apply_watch_event(&store, &loader, &user_dir, &project_dir, event).await;
                }
            }));
        }

        self.initialized = true;
        info!("persona manager initialized");
        Ok(())
    }

    /// Clear the store and repeat discovery from scratch with a fresh
    /// budget. The watcher is left untouched.
    pub async fn reload(&self) {
        self.full_load().await;
    }

    /// Stop the watcher, drop the store contents, and reset the initialized
    /// flag. Idempotent.
    pub async fn shutdown(&mut self) {
        self.watcher.stop();
        if let Some(task) = self.consumer.take() {
            task.abort();
        }
        self.store.write().await.clear();
        if self.initialized {
            info!("persona manager shut down");
        }
        self.initialized = false;
    }

    /// All valid resolved personas, bookkeeping stripped, ordered by id.
    pub async fn get_all(&self) -> Vec<PersonaRecord> {
        let records = self.store.read().await.records();
        resolver::resolve(&records)
            .into_values()
            .filter(|entry| entry.winner.is_valid)
            .map(|entry| entry.winner.persona)
            .collect()
    }

    /// The valid resolved persona for `id`, if any.
    pub async fn get_one(&self, id: &str) -> Option<PersonaRecord> {
        let records = self.store.read().await.records();
        resolver::resolve(&records)
            .remove(id)
            .filter(|entry| entry.winner.is_valid)
            .map(|entry| entry.winner.persona)
    }

    /// Statistics, conflicts, invalid entries, and advisory warnings.
    pub async fn get_info(&self) -> PersonaInfo {
        let records = self.store.read().await.records();

        let conflicts = resolver::resolve(&records)
            .into_iter()
            .filter(|(_, entry)| !entry.losers.is_empty())
            .map(|(id, entry)| {
                let mut loser_tiers: Vec<SourceTier> =
                    entry.losers.iter().map(|r| r.source.tier).collect();
                loser_tiers.sort_unstable_by(|a, b| b.cmp(a));
                let mut sources = vec![entry.winner.source.tier];
                sources.extend(loser_tiers);
                ConflictInfo { id, sources }
            })
            .collect();

        let invalid = records
            .iter()
            .filter(|r| !r.is_valid)
            .map(|r| InvalidInfo {
                id: r.id().to_string(),
                path: r.source.file_path.clone(),
                errors: r.validation_errors.clone(),
            })
            .collect();

        PersonaInfo {
            statistics: resolver::statistics(&records),
            conflicts,
            invalid,
            warnings: resolver::check_compatibility(&records),
        }
    }

    /// Inject a record as a valid default-tier entry.
    pub async fn add(&self, record: PersonaRecord) {
        let loaded = LoadedPersona::valid(record, PersonaSource::builtin());
        self.store.write().await.insert(loaded);
    }

    /// Remove the default-tier entry for `id`. File-backed entries are owned
    /// by the filesystem and are not touched. Returns whether an entry was
    /// removed.
    pub async fn remove(&self, id: &str) -> bool {
        self.store.write().await.remove_default(id).is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    async fn full_load(&self) {
        let budget = LoadBudget::new(self.loader.limits().max_total_files);

        let mut records = builtin_personas();
        let (user_records, budget) = self
            .loader
            .load_directory(&self.user_dir, SourceTier::User, budget)
            .await;
        records.extend(user_records);
        let (project_records, budget) = self
            .loader
            .load_directory(&self.project_dir, SourceTier::Project, budget)
            .await;
        records.extend(project_records);

        let mut store = self.store.write().await;
        store.clear();
        for record in records {
            store.insert(record);
        }
        info!(
            total = store.len(),
            budget_remaining = budget.remaining(),
            "persona load cycle complete"
        );
    }
}

/// Apply one debounced watch event to the store.
///
/// Single-file reloads intentionally bypass the bulk-cycle budget: the cycle
/// cap bounds startup and reload cost, while watch events arrive one file at
/// a time and are already bounded by the per-file size limit.
async fn apply_watch_event(
    store: &Arc<RwLock<PersonaStore>>,
    loader: &PersonaLoader,
    user_dir: &Path,
    project_dir: &Path,
    event: PersonaFileEvent,
) {
    match event.kind {
        WatchEventKind::Added | WatchEventKind::Changed => {
            let (tier, base_dir) = classify_tier(&event.path, user_dir, project_dir);
            let loaded = loader.load_one(&event.path, tier, base_dir, None).await;
            let mut store = store.write().await;
            // Replace by path, not by key: an edit that changes the file's id
            // must migrate the entry to the new id's slot.
            store.remove_by_path(&event.path);
            store.insert(loaded);
            debug!(path = %event.path.display(), %tier, "applied watch update");
        }
        WatchEventKind::Removed => {
            let removed = store.write().await.remove_by_path(&event.path);
            debug!(
                path = %event.path.display(),
                removed = removed.len(),
                "applied watch removal"
            );
        }
    }
}

/// Classify a changed file's tier by directory prefix.
///
/// The `Default` fallback is latent: default records are never file-backed,
/// so watch events should always match one of the two roots. Kept rather
/// than removed.
fn classify_tier<'a>(
    path: &Path,
    user_dir: &'a Path,
    project_dir: &'a Path,
) -> (SourceTier, Option<&'a Path>) {
    if path.starts_with(project_dir) {
        (SourceTier::Project, Some(project_dir))
    } else if path.starts_with(user_dir) {
        (SourceTier::User, Some(user_dir))
    } else {
        (SourceTier::Default, None)
    }
}

async fn canonical_or_configured(dir: &Path) -> PathBuf {
    match tokio::fs::canonicalize(dir).await {
        Ok(canonical) => canonical,
        Err(_) => dir.to_path_buf(),
    }
}
