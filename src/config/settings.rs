use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{PersonaError, Result};
use crate::loader::{
    DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES_PER_DIRECTORY, DEFAULT_MAX_TOTAL_FILES,
    ResourceLimits,
};
use crate::watcher::DEFAULT_DEBOUNCE_MS;

pub const CONFIG_FILE: &str = "personas.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub directories: DirectoryConfig,
    pub watch: WatchConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub user: PathBuf,
    pub project: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        let user = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".personas"))
            .unwrap_or_else(|| PathBuf::from(".personas"));
        Self {
            user,
            project: PathBuf::from("./.personas"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_file_size: u64,
    pub max_files_per_directory: usize,
    pub max_total_files: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files_per_directory: DEFAULT_MAX_FILES_PER_DIRECTORY,
            max_total_files: DEFAULT_MAX_TOTAL_FILES,
        }
    }
}

impl PersonaConfig {
    /// Load `personas.toml` from `dir`, falling back to defaults when the
    /// file is absent.
    pub async fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.limits.max_file_size == 0 {
            errors.push("limits.max_file_size must be greater than 0");
        }
        if self.limits.max_files_per_directory == 0 {
            errors.push("limits.max_files_per_directory must be greater than 0");
        }
        if self.limits.max_total_files == 0 {
            errors.push("limits.max_total_files must be greater than 0");
        }
        if self.limits.max_files_per_directory > self.limits.max_total_files {
            errors.push("limits.max_files_per_directory must not exceed limits.max_total_files");
        }
        if self.watch.debounce_ms == 0 {
            errors.push("watch.debounce_ms must be greater than 0");
        }
        if self.directories.user.as_os_str().is_empty() {
            errors.push("directories.user must not be empty");
        }
        if self.directories.project.as_os_str().is_empty() {
            errors.push("directories.project must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PersonaError::Config(errors.join("; ")))
        }
    }

    pub fn resource_limits(&self) -> ResourceLimits {
        ResourceLimits {
            max_file_size: self.limits.max_file_size,
            max_files_per_directory: self.limits.max_files_per_directory,
            max_total_files: self.limits.max_total_files,
        }
    }
}
