//! Paths and settings used by keyholder
//!
//! Defaults:
//! - Index: ~/.keyholder_index
//! - Legacy store: ~/.keyholder.json
//! - Settings: ~/.config/keyholder/config.json (optional)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Namespace used for every entry in the OS keychain
pub const DEFAULT_NAMESPACE: &str = "keyholder";

/// Seconds before a copied key is wiped from the clipboard
pub const DEFAULT_CLIPBOARD_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration, passed into every component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File listing known key names, one per line
    pub index_path: PathBuf,
    /// Plaintext JSON store from older releases
    pub legacy_path: PathBuf,
    /// Keychain service name
    pub namespace: String,
    /// Default auto-clear delay for `get`
    pub clipboard_timeout: Duration,
}

impl Config {
    /// Defaults rooted at a home directory
    pub fn for_home(home: &Path) -> Self {
        Self {
            index_path: home.join(".keyholder_index"),
            legacy_path: home.join(".keyholder.json"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            clipboard_timeout: Duration::from_secs(DEFAULT_CLIPBOARD_TIMEOUT_SECS),
        }
    }

    /// Resolve the user's home directory and apply the settings file, if any
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        let mut config = Self::for_home(&home);

        if let Some(path) = Settings::default_path() {
            let settings = Settings::load(&path)?;
            config.apply(settings);
        }

        Ok(config)
    }

    /// Overlay user settings on top of the defaults
    pub fn apply(&mut self, settings: Settings) {
        if let Some(namespace) = settings.namespace {
            self.namespace = namespace;
        }
        if let Some(path) = settings.index_path {
            self.index_path = path;
        }
        if let Some(path) = settings.legacy_path {
            self.legacy_path = path;
        }
        self.clipboard_timeout = Duration::from_secs(settings.clipboard_timeout_secs);
    }
}

/// Optional user settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Keychain service name override
    #[serde(default)]
    pub namespace: Option<String>,

    /// Default auto-clear delay (0 disables)
    #[serde(default = "default_clipboard_timeout_secs")]
    pub clipboard_timeout_secs: u64,

    #[serde(default)]
    pub index_path: Option<PathBuf>,

    #[serde(default)]
    pub legacy_path: Option<PathBuf>,
}

fn default_clipboard_timeout_secs() -> u64 {
    DEFAULT_CLIPBOARD_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: None,
            clipboard_timeout_secs: default_clipboard_timeout_secs(),
            index_path: None,
            legacy_path: None,
        }
    }
}

impl Settings {
    /// ~/.config/keyholder/config.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keyholder").join("config.json"))
    }

    /// Load settings from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }
}
