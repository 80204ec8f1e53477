use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::memory::search::FieldWeights;

/// Directory used when nothing else is configured, relative to the
/// working directory of the calling agent host.
pub const DEFAULT_BASE_DIR: &str = ".claude/memory";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error occurred while reading/writing config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    /// Refused to overwrite an existing config file
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

/// Store configuration (`mnemo.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryConfig {
    /// Directory holding one JSON file per category
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Default entry cap for Read
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,

    /// Characters of value shown by List before truncating
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Write to a temp file and rename over the target
    #[serde(default = "default_true")]
    pub atomic_writes: bool,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub prune: PruneConfig,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BASE_DIR)
}

fn default_read_limit() -> usize {
    50
}

fn default_preview_chars() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            read_limit: default_read_limit(),
            preview_chars: default_preview_chars(),
            atomic_writes: true,
            search: SearchConfig::default(),
            prune: PruneConfig::default(),
        }
    }
}

/// Search defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub fuzzy: bool,
    /// Minimum similarity (0-1) a fuzzy hit must reach
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default)]
    pub weights: FieldWeights,
}

fn default_threshold() -> f64 {
    0.4
}

fn default_search_limit() -> usize {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy: true,
            threshold: default_threshold(),
            limit: default_search_limit(),
            weights: FieldWeights::default(),
        }
    }
}

/// Prune defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneConfig {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    /// Entries kept per category
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Keys listed per category in a dry-run preview
    #[serde(default = "default_preview_cap")]
    pub preview_cap: usize,
}

fn default_max_age_days() -> u32 {
    90
}

fn default_max_entries() -> usize {
    100
}

fn default_preview_cap() -> usize {
    10
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            max_entries: default_max_entries(),
            preview_cap: default_preview_cap(),
        }
    }
}
