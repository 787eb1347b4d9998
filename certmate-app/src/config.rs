//! Store configuration.
//!
//! Loaded once at startup; the directories it names become the process-wide
//! allowed roots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use certmate_core::error::{CoreError, CoreResult};
use certmate_core::types::TokenPolicy;
use serde::{Deserialize, Serialize};

use crate::adapters::DEFAULT_LOCK_TIMEOUT;

/// Default settings file name inside `data_dir`
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Settings and other application data
    pub data_dir: PathBuf,
    /// Issued certificates
    pub cert_dir: PathBuf,
    /// Settings backups
    pub backup_dir: PathBuf,
    /// Settings file name, relative to `data_dir`
    pub settings_file: String,
    /// Upper bound on waiting for a file lock
    pub lock_timeout_ms: u64,
    pub token_policy: TokenPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_base_dir(".")
    }
}

impl StoreConfig {
    /// Lay out `data/`, `certificates/` and `backups/` under `base`
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            data_dir: base.join("data"),
            cert_dir: base.join("certificates"),
            backup_dir: base.join("backups"),
            settings_file: DEFAULT_SETTINGS_FILE.to_string(),
            lock_timeout_ms: u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(5_000),
            token_policy: TokenPolicy::default(),
        }
    }

    /// Read a JSON config file. Relative directories are taken relative to the
    /// file's own directory; missing fields keep their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            CoreError::ConfigError(format!("Invalid config {}: {e}", path.display()))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for dir in [
            &mut config.data_dir,
            &mut config.cert_dir,
            &mut config.backup_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings file names that could leave `data_dir`
    pub fn validate(&self) -> CoreResult<()> {
        let file = Path::new(&self.settings_file);
        let single_component = file.components().count() == 1
            && file.file_name().is_some_and(|name| name == file.as_os_str());
        if self.settings_file.is_empty() || !single_component {
            return Err(CoreError::ConfigError(format!(
                "settings_file must be a plain file name, got {:?}",
                self.settings_file
            )));
        }
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Data, certificate and backup directories, in that order
    pub fn allowed_roots(&self) -> [&Path; 3] {
        [&self.data_dir, &self.cert_dir, &self.backup_dir]
    }
}
