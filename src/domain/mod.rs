//! Persona domain model.
//!
//! - `PersonaRecord`: the schema-validated payload.
//! - `SourceTier` / `PersonaSource`: origin classification (default, user, project).
//! - `LoadedPersona`: payload plus load bookkeeping.
//! - `builtin_personas`: the code-defined default tier.

mod defaults;
mod persona;
mod source;

pub use defaults::builtin_personas;
pub use persona::{BehaviorDiagram, PersonaBehavior, PersonaCore, PersonaExpertise, PersonaRecord};
pub use source::{DEFAULT_VERSION, LoadedPersona, PersonaSource, SourceTier};
