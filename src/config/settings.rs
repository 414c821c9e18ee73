use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StashError};

/// Project-level configuration, loaded from `.stash.toml`.
///
/// Every field has a default so Stash works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where the local cache record lives (default: `~/.config/stash/cache.json`).
    #[serde(default)]
    pub cache_path: Option<String>,

    /// Remote store used when `--connector` is not given.
    #[serde(default = "default_store")]
    pub store: String,

    /// Root directory of the `file` store.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Google Drive client registration.
    #[serde(default)]
    pub drive: DriveSettings,
}

/// `[drive]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Token cache file (default: `~/.config/stash/drive-token.json`).
    #[serde(default)]
    pub token_path: Option<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store() -> String {
    "file".to_string()
}

fn default_store_dir() -> String {
    ".".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_path: None,
            store: default_store(),
            store_dir: default_store_dir(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            drive: DriveSettings::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".stash.toml";

    /// Load settings from `<project_dir>/.stash.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            StashError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.argon2_params().validate().map_err(|e| {
            StashError::Config(format!("{}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve the cache path: configured value, else the per-user default.
    pub fn cache_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache_path {
            return Ok(expand_home(path));
        }
        config_dir()
            .map(|dir| dir.join("cache.json"))
            .ok_or_else(|| {
                StashError::Config("cannot locate home directory; set cache_path".into())
            })
    }

    /// Root of the `file` store.
    pub fn store_dir_path(&self) -> PathBuf {
        expand_home(&self.store_dir)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> crate::crypto::kdf::Argon2Params {
        crate::crypto::kdf::Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Resolve Drive client settings, letting environment variables win.
    #[cfg(feature = "cloud-store")]
    pub fn drive_config(&self) -> Result<crate::remote::drive::DriveConfig> {
        let client_id = std::env::var("STASH_DRIVE_CLIENT_ID")
            .ok()
            .or_else(|| self.drive.client_id.clone())
            .ok_or_else(|| {
                StashError::Config(
                    "Google Drive needs a client id — set [drive] client_id or STASH_DRIVE_CLIENT_ID"
                        .into(),
                )
            })?;
        let client_secret = std::env::var("STASH_DRIVE_CLIENT_SECRET")
            .ok()
            .or_else(|| self.drive.client_secret.clone())
            .unwrap_or_default();
        let redirect_uri = self
            .drive
            .redirect_uri
            .clone()
            .unwrap_or_else(|| "urn:ietf:wg:oauth:2.0:oob".to_string());
        let token_path = match &self.drive.token_path {
            Some(path) => expand_home(path),
            None => config_dir()
                .map(|dir| dir.join("drive-token.json"))
                .ok_or_else(|| {
                    StashError::Config("cannot locate home directory; set [drive] token_path".into())
                })?,
        };

        Ok(crate::remote::drive::DriveConfig {
            client_id,
            client_secret,
            redirect_uri,
            token_path,
        })
    }
}

/// `$HOME/.config/stash` on all platforms.
fn config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join("stash"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
