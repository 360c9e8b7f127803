//! Bounded persona file loading.
//!
//! Discovery and loading never abort a cycle: every per-file failure is
//! converted into an invalid `LoadedPersona`, and inaccessible directories
//! degrade to empty results. The per-cycle file allowance is an explicit
//! `LoadBudget` value threaded through calls and handed back updated, so a
//! fresh budget per cycle is the only reset there is.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{LoadedPersona, PersonaSource, SourceTier};
use crate::error::PersonaError;
use crate::guard;
use crate::schema::{self, SchemaFailure};

pub const PERSONA_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Directories skipped during discovery (version control and dependency trees).
const EXCLUDED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", "target", "vendor"];

pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_MAX_FILES_PER_DIRECTORY: usize = 50;
pub const DEFAULT_MAX_TOTAL_FILES: usize = 200;

/// Process-wide caps, constant for one load cycle.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_file_size: u64,
    pub max_files_per_directory: usize,
    pub max_total_files: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files_per_directory: DEFAULT_MAX_FILES_PER_DIRECTORY,
            max_total_files: DEFAULT_MAX_TOTAL_FILES,
        }
    }
}

/// Remaining file allowance for one load cycle.
///
/// A value type: `charge` consumes units and returns the reduced budget, so
/// stale budgets cannot leak between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBudget {
    remaining: usize,
}

impl LoadBudget {
    pub fn new(max_total_files: usize) -> Self {
        Self {
            remaining: max_total_files,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Consume up to `units`, saturating at zero.
    #[must_use]
    pub fn charge(self, units: usize) -> Self {
        Self {
            remaining: self.remaining.saturating_sub(units),
        }
    }
}

/// Loads and validates persona files under the configured limits.
#[derive(Debug, Clone)]
pub struct PersonaLoader {
    limits: ResourceLimits,
}

impl PersonaLoader {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Enumerate persona files under `dir`.
    ///
    /// An inaccessible directory yields an empty list, not an error. Matches
    /// are re-validated through the path guard, sorted for determinism, and
    /// truncated to `max_files` when given.
    pub async fn discover(&self, dir: &Path, max_files: Option<usize>) -> Vec<PathBuf> {
        let canonical_dir = match tokio::fs::canonicalize(dir).await {
            Ok(d) => d,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "persona directory inaccessible, skipping");
                return Vec::new();
            }
        };

        let mut candidates: Vec<PathBuf> = WalkDir::new(&canonical_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !is_excluded_dir(entry.file_name().to_str())
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| guard::has_allowed_extension(path, PERSONA_EXTENSIONS))
            .collect();
        candidates.sort();

        let mut validated = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match guard::validate_path(&candidate, &canonical_dir).await {
                Ok(path) => validated.push(path),
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "discovered file failed path validation");
                }
            }
        }

        if let Some(cap) = max_files {
            validated.truncate(cap);
        }
        validated
    }

    /// Load and validate a single file.
    ///
    /// Infallible by contract: every failure mode (containment, extension,
    /// size, read, parse, schema) is recorded on an invalid record instead of
    /// raised. The size check runs against metadata before any content read.
    pub async fn load_one(
        &self,
        path: &Path,
        tier: SourceTier,
        base_dir: Option<&Path>,
        max_size: Option<u64>,
    ) -> LoadedPersona {
        let derived_id = derived_id(path);

        let path = if let Some(base) = base_dir {
            match guard::validate_path(path, base).await {
                Ok(validated) => validated,
                Err(e) => {
                    return LoadedPersona::invalid(
                        derived_id,
                        PersonaSource::file(tier, path.to_path_buf(), None),
                        vec![e.to_string()],
                    );
                }
            }
        } else {
            path.to_path_buf()
        };

        if !guard::has_allowed_extension(&path, PERSONA_EXTENSIONS) {
            let err =
                PersonaError::Security(format!("disallowed extension on {}", path.display()));
            return LoadedPersona::invalid(
                derived_id,
                PersonaSource::file(tier, path.clone(), None),
                vec![err.to_string()],
            );
        }

        let (size, last_modified) = match tokio::fs::metadata(&path).await {
            Ok(meta) => (meta.len(), meta.modified().ok().map(DateTime::<Utc>::from)),
            Err(e) => {
                let err =
                    PersonaError::Filesystem(format!("cannot stat {}: {e}", path.display()));
                return LoadedPersona::invalid(
                    derived_id,
                    PersonaSource::file(tier, path.clone(), None),
                    vec![err.to_string()],
                );
            }
        };
        let source = PersonaSource::file(tier, path.clone(), last_modified);

        let cap = max_size.unwrap_or(self.limits.max_file_size);
        if size > cap {
            let err = PersonaError::ResourceLimit(format!(
                "{} is {size} bytes, cap is {cap}",
                path.display()
            ));
            return LoadedPersona::invalid(derived_id, source, vec![err.to_string()]);
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                let err =
                    PersonaError::Filesystem(format!("cannot read {}: {e}", path.display()));
                return LoadedPersona::invalid(derived_id, source, vec![err.to_string()]);
            }
        };

        match schema::parse_and_validate(&content) {
            Ok(record) => {
                debug!(id = %record.id, path = %path.display(), %tier, "loaded persona");
                LoadedPersona::valid(record, source)
            }
            Err(failure) => {
                let errors = match failure {
                    SchemaFailure::Parse(message) => {
                        vec![PersonaError::Parse(message).to_string()]
                    }
                    SchemaFailure::Shape(messages) => messages
                        .into_iter()
                        .map(|message| {
                            PersonaError::Schema {
                                path: path.clone(),
                                message,
                            }
                            .to_string()
                        })
                        .collect(),
                };
                debug!(path = %path.display(), count = errors.len(), "persona failed validation");
                LoadedPersona::invalid(derived_id, source, errors)
            }
        }
    }

    /// Load every persona file under `dir`, bounded by the per-directory cap
    /// and the remaining cycle budget.
    ///
    /// The effective cap is fixed before any load is issued; loads fan out
    /// concurrently with no ordering guarantee. Each load that completes,
    /// valid or invalid, consumes one budget unit. A load task that panics is
    /// converted to an invalid record without consuming budget — a deliberate
    /// asymmetry carried over from the original behavior.
    pub async fn load_directory(
        &self,
        dir: &Path,
        tier: SourceTier,
        budget: LoadBudget,
    ) -> (Vec<LoadedPersona>, LoadBudget) {
        let cap = self.limits.max_files_per_directory.min(budget.remaining());
        if cap == 0 {
            warn!(dir = %dir.display(), "load budget exhausted, skipping directory");
            return (Vec::new(), budget);
        }

        let paths = self.discover(dir, Some(cap)).await;
        if paths.is_empty() {
            return (Vec::new(), budget);
        }

        let base_dir = dir.to_path_buf();
        let tasks: Vec<_> = paths
            .iter()
            .map(|path| {
                let loader = self.clone();
                let path = path.clone();
                let base = base_dir.clone();
                tokio::spawn(async move { loader.load_one(&path, tier, Some(&base), None).await })
            })
            .collect();

        let mut records = Vec::with_capacity(paths.len());
        let mut budget = budget;
        for (path, joined) in paths.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(loaded) => {
                    records.push(loaded);
                    budget = budget.charge(1);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "persona load task failed");
                    records.push(LoadedPersona::invalid(
                        derived_id(&path),
                        PersonaSource::file(tier, path, None),
                        vec![format!("load task failed: {e}")],
                    ));
                }
            }
        }

        (records, budget)
    }
}

impl Default for PersonaLoader {
    fn default() -> Self {
        Self::new(ResourceLimits::default())
    }
}

fn is_excluded_dir(name: Option<&str>) -> bool {
    name.is_some_and(|n| EXCLUDED_DIRS.contains(&n))
}

/// Fallback id for files that fail to load, derived from the file stem.
fn derived_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    guard::sanitize_filename(stem)
}
