//! TOML-backed settings for directories, watching, and resource limits.

mod settings;

pub use settings::{CONFIG_FILE, DirectoryConfig, LimitsConfig, PersonaConfig, WatchConfig};
