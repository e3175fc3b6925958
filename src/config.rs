//! Settings and per-user path resolution.
//!
//! Settings live in `trimview.json` in the config directory. The scratch
//! match frame lives in the data directory under `trim_view/`.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "trimview.json";
/// Scratch subdirectory inside the data directory
pub const TRIM_VIEW_DIR: &str = "trim_view";
/// Scratch asset written by every extraction
pub const MATCH_FRAME: &str = "match_frame.png";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom data directory (from CLI or ENV)
    pub data_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (TRIMVIEW_DATA_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let data_dir = cli_dir.or_else(|| std::env::var("TRIMVIEW_DATA_DIR").ok().map(PathBuf::from));
        Self { data_dir }
    }
}

/// Get path to a configuration file
///
/// Platform paths:
/// - Linux: ~/.config/trimview/{name}
/// - macOS: ~/Library/Application Support/trimview/{name}
/// - Windows: %APPDATA%\trimview\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file
///
/// Platform paths:
/// - Linux: ~/.local/share/trimview/{name}
/// - macOS: ~/Library/Application Support/trimview/{name}
/// - Windows: %APPDATA%\trimview\{name}
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Directory holding the scratch match frame.
pub fn scratch_dir(config: &PathConfig, settings: &TrimViewSettings) -> PathBuf {
    match &settings.scratch_dir {
        Some(dir) => dir.clone(),
        None => get_data_dir(config).join(TRIM_VIEW_DIR),
    }
}

/// Ensure a directory exists, creating parents as needed.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("trimview");
    }
    PathBuf::from(".")
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("trimview");
    }
    PathBuf::from(".")
}

/// Trim view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimViewSettings {
    /// Global toggle: when off, every trim transition and drag update is ignored
    pub show_trim_view: bool,
    /// Sleep between scratch-asset existence checks
    pub poll_interval_ms: u64,
    /// Give up waiting for the scratch asset after this long (None = wait forever)
    pub poll_timeout_ms: Option<u64>,
    /// Worker threads (0 = auto)
    pub workers: usize,
    /// Override for the scratch directory
    pub scratch_dir: Option<PathBuf>,
}

impl Default for TrimViewSettings {
    fn default() -> Self {
        Self {
            show_trim_view: true,
            poll_interval_ms: 100,
            poll_timeout_ms: None,
            workers: 0,
            scratch_dir: None,
        }
    }
}

impl TrimViewSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_ms.map(Duration::from_millis)
    }

    /// Load from JSON, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid settings JSON: {}", path.display()))
    }

    /// Like `load`, but a broken file only logs a warning.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("{:#}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("Failed to write settings: {}", path.display()))
    }
}
