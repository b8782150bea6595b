//! Configuration and identity storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::{Authenticator, Identity, IdentityStore};

/// Default number of conversations printed by `inbox`.
pub const DEFAULT_INBOX_LIMIT: usize = 20;

/// Application configuration
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON snapshot the local record store is loaded from and saved to
    pub data_file: Option<PathBuf>,
    /// Conversations shown by `inbox` when no limit is given
    pub inbox_limit: Option<usize>,
    /// Signed-in identity (from last login)
    pub identity: Option<Identity>,
}

impl Config {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "helperhive", "helperhive")
            .context("Could not determine config directory")
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Config holds the signed-in identity
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Snapshot file of the local record store.
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("records.json")),
        }
    }

    pub fn inbox_limit(&self) -> usize {
        self.inbox_limit.unwrap_or(DEFAULT_INBOX_LIMIT)
    }
}

impl IdentityStore for Config {
    fn get_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    fn clear_identity(&mut self) {
        self.identity = None;
    }
}

impl Authenticator for Config {
    fn current_identity(&self) -> Option<Identity> {
        self.get_identity()
    }
}
