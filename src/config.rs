//! Configuration for rms
//!
//! Loads user configuration from `~/.config/rms/config.toml` and resolves the
//! trash can locations once at startup.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default holding directory, relative to the home directory
pub const DEFAULT_HOLDING_DIR: &str = "~/.Trash";
/// Default ledger file, relative to the home directory
pub const DEFAULT_LEDGER_PATH: &str = "~/.trash/deleted";

/// Configuration structure
///
/// Example config.toml:
/// ```toml
/// holding_dir = "~/.Trash"
/// ledger_path = "~/.trash/deleted"
///
/// # Restore into the original directory instead of the current one
/// restore_to_original = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where deleted entries are moved to
    #[serde(default)]
    pub holding_dir: Option<String>,

    /// Ledger file recording every deletion
    #[serde(default)]
    pub ledger_path: Option<String>,

    /// If true, `undelete` restores to the original path by default
    #[serde(default)]
    pub restore_to_original: bool,
}

/// Resolved trash can locations, passed to the ledger and the mover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashPaths {
    pub holding_dir: PathBuf,
    pub ledger_path: PathBuf,
}

impl Config {
    /// Get the config file path: ~/.config/rms/config.toml
    ///
    /// If RMS_CONFIG environment variable is set, uses that path instead.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("RMS_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|d| d.join(".config").join("rms").join("config.toml"))
    }

    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the holding directory and ledger path, expanding `~`
    pub fn trash_paths(&self) -> TrashPaths {
        TrashPaths {
            holding_dir: expand_tilde(
                self.holding_dir.as_deref().unwrap_or(DEFAULT_HOLDING_DIR),
            ),
            ledger_path: expand_tilde(
                self.ledger_path.as_deref().unwrap_or(DEFAULT_LEDGER_PATH),
            ),
        }
    }
}

impl TrashPaths {
    pub fn new(holding_dir: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            holding_dir: holding_dir.into(),
            ledger_path: ledger_path.into(),
        }
    }

    /// Create the holding directory and an empty ledger file if absent
    pub fn ensure(&self) -> io::Result<()> {
        if !self.holding_dir.exists() {
            fs::create_dir_all(&self.holding_dir)?;
            tracing::debug!(dir = %self.holding_dir.display(), "created holding directory");
        }

        if let Some(parent) = self.ledger_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        if !self.ledger_path.exists() {
            fs::File::create(&self.ledger_path)?;
            tracing::debug!(ledger = %self.ledger_path.display(), "created ledger");
        }

        Ok(())
    }

    /// True when `target` is the holding directory, the ledger, or a parent of either
    pub fn is_protected(&self, target: &Path) -> bool {
        self.holding_dir.starts_with(target) || self.ledger_path.starts_with(target)
    }
}

/// Expand tilde (~) prefix to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}
