//! Application bootstrap for the CertMate settings store.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter injection),
//! `StoreConfig`, and the filesystem adapters (`PathGuard`, `FileStore`, ...).

pub mod adapters;
pub mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certmate_core::crypto::SecureTokenGenerator;
use certmate_core::error::{CoreError, CoreResult};
use certmate_core::services::{ServiceContext, SettingsService};
use certmate_core::traits::{BackupHook, SettingsStorage, TokenGenerator};
use certmate_core::types::Settings;
use certmate_core::validation::SettingsValidators;

use adapters::{FileBackupHook, FileSettingsStorage, FileStore, PathGuard};
pub use config::StoreConfig;

/// Platform-agnostic application state.
///
/// Every frontend constructs this once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Configuration the state was built from (directories made absolute)
    pub config: StoreConfig,
    /// Guarded file store over the allowed roots
    pub file_store: Arc<FileStore>,
    /// Service context (holds all collaborators)
    pub ctx: Arc<ServiceContext>,
    /// Settings service
    pub settings_service: Arc<SettingsService>,
}

impl AppState {
    pub fn settings_path(&self) -> PathBuf {
        self.config.settings_path()
    }

    /// Load (and self-heal) the settings document
    pub fn load_settings(&self) -> Settings {
        self.settings_service.load()
    }

    /// Validate and persist the settings document
    pub fn save_settings(&self, settings: &Settings) -> bool {
        self.settings_service.save(settings)
    }
}

/// Builder for constructing `AppState`.
///
/// # Required
/// - `config` — directories and token policy
///
/// # Optional
/// - `settings_storage` — defaults to `FileSettingsStorage` at `config.settings_path()`
/// - `backup_hook` — defaults to `FileBackupHook` in `config.backup_dir`
/// - `token_generator` — defaults to `SecureTokenGenerator`
/// - `validators` — defaults to the built-in validators under `config.token_policy`
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<StoreConfig>,
    settings_storage: Option<Arc<dyn SettingsStorage>>,
    backup_hook: Option<Arc<dyn BackupHook>>,
    token_generator: Option<Arc<dyn TokenGenerator>>,
    validators: Option<SettingsValidators>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn settings_storage(mut self, storage: Arc<dyn SettingsStorage>) -> Self {
        self.settings_storage = Some(storage);
        self
    }

    #[must_use]
    pub fn backup_hook(mut self, hook: Arc<dyn BackupHook>) -> Self {
        self.backup_hook = Some(hook);
        self
    }

    #[must_use]
    pub fn token_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = Some(generator);
        self
    }

    #[must_use]
    pub fn validators(mut self, validators: SettingsValidators) -> Self {
        self.validators = Some(validators);
        self
    }

    /// Build the `AppState`.
    ///
    /// Creates the configured directories if needed and fixes them as the
    /// allowed roots.
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if the config is missing or invalid, or
    /// a directory cannot be created.
    pub fn build(self) -> CoreResult<AppState> {
        let mut config = self
            .config
            .ok_or_else(|| CoreError::ConfigError("config is required".to_string()))?;
        config.validate()?;

        for dir in [
            &mut config.data_dir,
            &mut config.cert_dir,
            &mut config.backup_dir,
        ] {
            *dir = prepare_dir(dir)?;
        }

        let guard = PathGuard::new(config.allowed_roots())?;
        let file_store = Arc::new(FileStore::new(guard).with_lock_timeout(config.lock_timeout()));
        log::info!(
            "Settings store rooted at {:?}",
            file_store.guard().roots()
        );

        let settings_storage = self.settings_storage.unwrap_or_else(|| {
            Arc::new(FileSettingsStorage::new(
                Arc::clone(&file_store),
                config.settings_path(),
            ))
        });
        let backup_hook = self.backup_hook.unwrap_or_else(|| {
            Arc::new(FileBackupHook::new(
                Arc::clone(&file_store),
                config.backup_dir.clone(),
            ))
        });
        let token_generator = self
            .token_generator
            .unwrap_or_else(|| Arc::new(SecureTokenGenerator));
        let validators = self
            .validators
            .unwrap_or_else(|| SettingsValidators::with_policy(config.token_policy.clone()));

        let ctx = Arc::new(ServiceContext::new(
            settings_storage,
            backup_hook,
            token_generator,
            validators,
            config.token_policy.clone(),
        ));
        let settings_service = Arc::new(SettingsService::new(Arc::clone(&ctx)));

        Ok(AppState {
            config,
            file_store,
            ctx,
            settings_service,
        })
    }
}

/// Create `dir` if missing and return its absolute canonical form
fn prepare_dir(dir: &Path) -> CoreResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        CoreError::ConfigError(format!("Failed to create {}: {e}", dir.display()))
    })?;
    fs::canonicalize(dir).map_err(|e| {
        CoreError::ConfigError(format!("Failed to resolve {}: {e}", dir.display()))
    })
}
