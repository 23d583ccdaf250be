use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use modsort_util::errors::ModsortError;

use crate::id::ModId;

/// Global user configuration loaded from `~/.modsort/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// Mod source directories from `[sources]`, scanned in the listed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// Resolution settings from `[resolve]`.
///
/// `load-first` is empty unless configured, so unconstrained mods sort
/// alphabetically. Listing e.g. `ludeon.rimworld` there makes it win ties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default, rename = "load-first")]
    pub load_first: Vec<String>,
}

impl ResolveConfig {
    /// The load-first list as identities; blank entries are dropped.
    pub fn load_first_ids(&self) -> Vec<ModId> {
        self.load_first.iter().filter_map(|s| ModId::parse(s)).collect()
    }
}

impl GlobalConfig {
    /// Load the global configuration from `~/.modsort/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, or return defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ModsortError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            ModsortError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the modsort data directory.
///
/// `MODSORT_HOME` wins; otherwise `~/.modsort/`.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("MODSORT_HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".modsort")
}
