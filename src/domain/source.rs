use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::persona::PersonaRecord;

pub const DEFAULT_VERSION: &str = "1.0";

/// Origin classification of a record. Declaration order doubles as precedence
/// order: `Project > User > Default` under the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Default,
    User,
    Project,
}

impl SourceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::User => "user",
            Self::Project => "project",
        }
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a loaded record came from. `Default`-tier records are code-defined
/// and never file-backed, so both optional fields stay `None` for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSource {
    pub tier: SourceTier,
    pub file_path: Option<PathBuf>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl PersonaSource {
    pub fn builtin() -> Self {
        Self {
            tier: SourceTier::Default,
            file_path: None,
            last_modified: None,
        }
    }

    pub fn file(tier: SourceTier, path: PathBuf, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            tier,
            file_path: Some(path),
            last_modified,
        }
    }
}

/// A persona record plus its load bookkeeping.
///
/// Invariant: `is_valid` is false exactly when `validation_errors` is
/// non-empty. Failed load attempts still produce a value, marked invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedPersona {
    pub persona: PersonaRecord,
    pub version: String,
    pub source: PersonaSource,
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
}

impl LoadedPersona {
    pub fn valid(persona: PersonaRecord, source: PersonaSource) -> Self {
        let version = persona
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        Self {
            persona,
            version,
            source,
            is_valid: true,
            validation_errors: Vec::new(),
        }
    }

    /// Invalid placeholder for a failed load attempt. `errors` must be
    /// non-empty to uphold the validity invariant.
    pub fn invalid(derived_id: impl Into<String>, source: PersonaSource, errors: Vec<String>) -> Self {
        debug_assert!(!errors.is_empty(), "invalid record requires at least one error");
        Self {
            persona: PersonaRecord::placeholder(derived_id),
            version: DEFAULT_VERSION.to_string(),
            source,
            is_valid: false,
            validation_errors: errors,
        }
    }

    pub fn id(&self) -> &str {
        &self.persona.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_matches_precedence() {
        assert!(SourceTier::Project > SourceTier::User);
        assert!(SourceTier::User > SourceTier::Default);
    }

    #[test]
    fn valid_record_has_no_errors() {
        let loaded = LoadedPersona::valid(PersonaRecord::placeholder("x"), PersonaSource::builtin());
        assert!(loaded.is_valid);
        assert!(loaded.validation_errors.is_empty());
    }

    #[test]
    fn invalid_record_carries_errors() {
        let loaded = LoadedPersona::invalid(
            "broken",
            PersonaSource::builtin(),
            vec!["parse error".to_string()],
        );
        assert!(!loaded.is_valid);
        assert_eq!(loaded.validation_errors.len(), 1);
        assert_eq!(loaded.id(), "broken");
    }

    #[test]
    fn valid_record_takes_declared_version() {
        let mut record = PersonaRecord::placeholder("x");
        record.version = Some("2.3".to_string());
        let loaded = LoadedPersona::valid(record, PersonaSource::builtin());
        assert_eq!(loaded.version, "2.3");
    }
}
