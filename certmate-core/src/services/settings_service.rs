//! Settings service
//!
//! Owns the settings document: load with self-healing (migration, defaults,
//! token rotation) and validated, backed-up save. Holds no cache; every `load`
//! re-reads storage.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::services::{MigrationResult, MigrationService, ServiceContext};
use crate::types::{keys, Settings};

/// Backup reason used by plain `save`
const MANUAL_REASON: &str = "manual";

/// Settings service
pub struct SettingsService {
    ctx: Arc<ServiceContext>,
    migration: MigrationService,
}

impl SettingsService {
    /// Create a settings service instance
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            migration: MigrationService::new(),
        }
    }

    /// Load the settings document.
    ///
    /// Complete process: read -> migrate -> merge over defaults -> enforce token policy.
    /// Persists once when anything was healed. Never fails: unreadable storage
    /// yields (and persists) defaults.
    pub fn load(&self) -> Settings {
        let storage = self.ctx.settings_storage();

        if !storage.exists() {
            log::info!("No settings found, creating default settings");
            let settings = Settings::defaults(self.ctx.token_generator().generate());
            if !self.persist(&settings, "initial") {
                log::warn!("Failed to persist default settings");
            }
            return settings;
        }

        let (stored, readable) = match storage.read_document() {
            Some(settings) => (settings, true),
            None => {
                log::warn!("Stored settings are unreadable, falling back to defaults");
                (Settings::new(), false)
            }
        };

        let (migrated, migration) = self.migration.migrate_with_report(stored);
        let mut settings = migrated.merged_over(Settings::defaults(String::new()));
        let rotated = self.enforce_token_policy(&mut settings);

        let reason = match (&migration, readable, rotated) {
            (MigrationResult::Migrated { .. }, _, _) => Some("migration"),
            (_, false, _) => Some("recovery"),
            (_, _, true) => Some("token_rotation"),
            _ => None,
        };
        // Written without field validation; unrelated invalid fields stay as stored
        if let Some(reason) = reason {
            if !self.persist(&settings, reason) {
                log::warn!("Failed to persist healed settings ({reason})");
            }
        }

        settings
    }

    /// Validate and persist `settings`, labelling any backup as `"manual"`
    pub fn save(&self, settings: &Settings) -> bool {
        self.save_with_reason(settings, MANUAL_REASON)
    }

    /// Validate and persist `settings`.
    ///
    /// The first validator rejection returns `false` before any I/O. Validated
    /// (normalized) values are what gets written. If a prior document exists,
    /// the backup hook receives it first.
    pub fn save_with_reason(&self, settings: &Settings, reason: &str) -> bool {
        let validated = match self.validate(settings) {
            Ok(validated) => validated,
            Err(e) => {
                log::warn!("Settings rejected: {e}");
                return false;
            }
        };

        self.persist(&validated, reason)
    }

    /// Back up the prior document (if any) and write `settings` as is
    fn persist(&self, settings: &Settings, reason: &str) -> bool {
        let storage = self.ctx.settings_storage();
        if storage.exists() {
            match storage.read_raw() {
                Some(raw) => {
                    if let Some(backup) = self.ctx.backup_hook().backup(&raw, reason) {
                        log::info!("Settings backed up to {backup}");
                    }
                }
                None => log::warn!("Could not read existing settings for backup"),
            }
        }

        let written = storage.write_document(settings);
        if written {
            log::info!("Settings saved ({reason})");
        } else {
            log::error!("Failed to write settings ({reason})");
        }
        written
    }

    /// Run the field validators over `settings`, returning the normalized document.
    ///
    /// Empty or null `email` is allowed (not configured yet); a present
    /// `api_bearer_token` and every `domains` entry must pass.
    pub fn validate(&self, settings: &Settings) -> CoreResult<Settings> {
        let validators = &self.ctx.validators;
        let mut validated = settings.clone();

        match settings.get(keys::EMAIL) {
            None | Some(Value::Null) => {}
            Some(Value::String(email)) if email.trim().is_empty() => {}
            Some(Value::String(email)) => {
                let email = validators.email.validate(email)?;
                validated.insert(keys::EMAIL, Value::String(email));
            }
            Some(_) => return Err(field_type_error(keys::EMAIL)),
        }

        match settings.get(keys::API_BEARER_TOKEN) {
            None => {}
            Some(Value::String(token)) => {
                let token = validators.api_token.validate(token)?;
                validated.insert(keys::API_BEARER_TOKEN, Value::String(token));
            }
            Some(_) => return Err(field_type_error(keys::API_BEARER_TOKEN)),
        }

        match settings.get(keys::DOMAINS) {
            None => {}
            Some(Value::Array(entries)) => {
                let domains = entries
                    .iter()
                    .map(|entry| self.validate_domain_entry(entry))
                    .collect::<CoreResult<Vec<_>>>()?;
                validated.insert(keys::DOMAINS, Value::Array(domains));
            }
            Some(_) => return Err(field_type_error(keys::DOMAINS)),
        }

        Ok(validated)
    }

    /// A domain entry is a bare name or an object carrying a `domain` field
    fn validate_domain_entry(&self, entry: &Value) -> CoreResult<Value> {
        let validator = &self.ctx.validators.domain;
        match entry {
            Value::String(domain) => Ok(Value::String(validator.validate(domain)?)),
            Value::Object(fields) => {
                let Some(domain) = fields.get(keys::DOMAIN).and_then(Value::as_str) else {
                    return Err(CoreError::ValidationError(
                        "Domain entry is missing its 'domain' field".to_string(),
                    ));
                };
                let mut fields = fields.clone();
                fields.insert(
                    keys::DOMAIN.to_string(),
                    Value::String(validator.validate(domain)?),
                );
                Ok(Value::Object(fields))
            }
            _ => Err(CoreError::ValidationError(format!(
                "Invalid domain entry: {entry}"
            ))),
        }
    }

    /// Load, apply `change`, and save.
    ///
    /// Unlike `save`, failures come back as errors so callers can show the reason.
    pub fn update<F>(&self, change: F) -> CoreResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load();
        change(&mut settings);
        let validated = self.validate(&settings)?;
        if self.save(&validated) {
            Ok(validated)
        } else {
            Err(CoreError::StorageError(
                "Failed to write settings".to_string(),
            ))
        }
    }

    /// Replace the API bearer token with a freshly generated one
    pub fn rotate_api_token(&self) -> CoreResult<String> {
        let token = self.ctx.token_generator().generate();
        let new_token = token.clone();
        self.update(move |settings| {
            settings.insert(keys::API_BEARER_TOKEN, Value::String(new_token));
        })?;
        log::info!("API bearer token rotated");
        Ok(token)
    }

    /// Replace a missing or insecure token; returns whether it changed
    fn enforce_token_policy(&self, settings: &mut Settings) -> bool {
        let secure = settings
            .api_bearer_token()
            .is_some_and(|token| self.ctx.token_policy.is_secure(token));
        if secure {
            return false;
        }

        log::warn!("API bearer token is missing or insecure, generating a new one");
        let token = self.ctx.token_generator().generate();
        if !self.ctx.token_policy.is_secure(&token) {
            log::warn!("Generated API token does not satisfy the token policy");
        }
        settings.insert(keys::API_BEARER_TOKEN, Value::String(token));
        true
    }
}

fn field_type_error(field: &str) -> CoreError {
    CoreError::ValidationError(format!("Field '{field}' has an invalid type"))
}
