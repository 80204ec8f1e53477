//! Store configuration
//!
//! Loaded from `mnemo.toml` (current directory first, then the user config
//! directory), then adjusted by `MNEMO_*` environment variables.

pub mod types;


pub use types::*;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::util::expand_home;

pub const CONFIG_FILE_NAME: &str = "mnemo.toml";

/// Environment variable overriding [`MemoryConfig::base_dir`]
pub const ENV_MEMORY_DIR: &str = "MNEMO_MEMORY_DIR";
pub const ENV_SEARCH_THRESHOLD: &str = "MNEMO_SEARCH_THRESHOLD";
pub const ENV_ATOMIC_WRITES: &str = "MNEMO_ATOMIC_WRITES";

impl MemoryConfig {
    /// Load configuration from file
    ///
    /// Searches for `mnemo.toml` in the following order:
    /// 1. Current directory (`./mnemo.toml`)
    /// 2. User config directory (`~/.config/mnemo/mnemo.toml`)
    ///
    /// If neither file exists, returns `MemoryConfig::default()`.
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::locate() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.base_dir = expand_home(&config.base_dir);
        config.check()?;
        Ok(config)
    }

    /// The file [`MemoryConfig::load`] reads, if any exists
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        Self::user_config_path().filter(|path| path.exists())
    }

    /// Parse a specific TOML file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MemoryConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Write a fresh config file, refusing to replace one unless `force`.
    pub fn create(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        self.save(path)
    }

    /// `~/.config/mnemo/mnemo.toml` or the platform equivalent
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mnemo").join(CONFIG_FILE_NAME))
    }

    /// Apply environment variable overrides
    ///
    /// - `MNEMO_MEMORY_DIR` → overrides `base_dir`
    /// - `MNEMO_SEARCH_THRESHOLD` → overrides `search.threshold`
    /// - `MNEMO_ATOMIC_WRITES` → overrides `atomic_writes`
    ///
    /// Invalid values are logged as warnings but don't cause errors.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var(ENV_MEMORY_DIR) {
            if !dir.trim().is_empty() {
                self.base_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = env::var(ENV_SEARCH_THRESHOLD) {
            match raw.parse::<f64>() {
                Ok(t) if (0.0..=1.0).contains(&t) => self.search.threshold = t,
                _ => warn!("Invalid {} value: {}", ENV_SEARCH_THRESHOLD, raw),
            }
        }

        if let Ok(raw) = env::var(ENV_ATOMIC_WRITES) {
            match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.atomic_writes = true,
                "0" | "false" | "no" => self.atomic_writes = false,
                _ => warn!("Invalid {} value: {}", ENV_ATOMIC_WRITES, raw),
            }
        }
    }

    /// Reject values no operation can work with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "search.threshold must be within 0..=1, got {}",
                self.search.threshold
            )));
        }
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("base_dir is empty".to_string()));
        }
        Ok(())
    }
}
