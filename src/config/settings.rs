use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{MemeVaultError, Result};

/// Project-level configuration, loaded from `.memevault.toml`.
///
/// Every field has a sensible default so Memevault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file used when `--vault` is not given.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Directory holding keys and the audit log (default: `~/.memevault`).
    #[serde(default)]
    pub state_dir: Option<String>,

    /// Identity file used when `--key` is not given
    /// (default: `<state_dir>/keys/memevault.key`).
    #[serde(default)]
    pub identity_file: Option<String>,

    /// JSON endpoint returning `{ "url": ... }` for a random cover image.
    #[serde(default = "default_cover_api_url")]
    pub cover_api_url: String,

    /// Timeout for each cover image request, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "secrets.jpg".to_string()
}

fn default_cover_api_url() -> String {
    "https://meme-api.com/gimme".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            state_dir: None,
            identity_file: None,
            cover_api_url: default_cover_api_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".memevault.toml";

    /// Name of the state directory under `$HOME`.
    const STATE_DIR_NAME: &'static str = ".memevault";

    /// Load settings from `<project_dir>/.memevault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            MemeVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Directory for keys and the audit log.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|home| home.join(Self::STATE_DIR_NAME))
            .ok_or_else(|| {
                MemeVaultError::ConfigError(
                    "cannot determine home directory; set `state_dir` in .memevault.toml".into(),
                )
            })
    }

    /// Directory holding identity files.
    pub fn keys_dir(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join("keys"))
    }

    /// Default identity file path.
    pub fn identity_path(&self) -> Result<PathBuf> {
        match &self.identity_file {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.keys_dir()?.join("memevault.key")),
        }
    }

    /// Per-request timeout for the cover image download.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
