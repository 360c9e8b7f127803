use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// Load-path failures (security, limits, parse, schema, filesystem) are
/// contained: the loader stringifies them onto invalid records instead of
/// propagating. `Lifecycle` is the one kind surfaced synchronously to the
/// caller, by the watcher on API misuse.
#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Security violation: {0}")]
    Security(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema validation failed for {path}: {message}")]
    Schema { path: PathBuf, message: String },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PersonaError>;
