//! Layered persona registry with secure loading, precedence resolution, and
//! live reload.
//!
//! Persona records come from three tiers — code-defined defaults, a
//! user-level directory, and a project-level directory — and are merged under
//! `project > user > default` precedence. The pipeline enforces path
//! containment, per-file and per-cycle resource caps, and keeps the merged
//! view current through debounced filesystem watching.
//!
//! Entry point: [`PersonaManager`].

pub mod config;
pub mod domain;
pub mod error;
pub mod guard;
pub mod loader;
pub mod manager;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod watcher;

pub use config::{DirectoryConfig, LimitsConfig, PersonaConfig, WatchConfig};
pub use domain::{
    BehaviorDiagram, LoadedPersona, PersonaBehavior, PersonaCore, PersonaExpertise, PersonaRecord,
    PersonaSource, SourceTier, builtin_personas,
};
pub use error::{PersonaError, Result};
pub use loader::{LoadBudget, PersonaLoader, ResourceLimits};
pub use manager::{ConflictInfo, InvalidInfo, PersonaInfo, PersonaManager};
pub use resolver::{ResolvedEntry, ResolverStats};
pub use schema::SchemaFailure;
pub use store::{PersonaStore, StoreKey};
pub use watcher::{PersonaFileEvent, PersonaWatcher, WatchEventKind, WatcherState};
