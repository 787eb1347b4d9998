//! Settings storage abstraction Trait

use std::sync::{Mutex, PoisonError};

use crate::types::Settings;

/// Settings storage Trait
///
/// The seam between `SettingsService` and the persistence layer. Every method
/// absorbs its own failures: reads degrade to `None`, writes to `false`.
///
/// Platform implementations:
/// - `FileSettingsStorage` (certmate-app): path-guarded, locked, atomic JSON file
/// - `InMemorySettingsStorage`: tests and embedding without a filesystem
pub trait SettingsStorage: Send + Sync {
    /// Whether a settings document has been persisted before
    fn exists(&self) -> bool;

    /// Read and parse the stored document.
    ///
    /// Returns `None` when the document is missing, unreadable or not a JSON object.
    fn read_document(&self) -> Option<Settings>;

    /// Read the stored document verbatim (used for backups)
    fn read_raw(&self) -> Option<String>;

    /// Persist the document, replacing any previous content atomically
    fn write_document(&self, settings: &Settings) -> bool;
}

/// In-memory settings storage
///
/// Keeps the serialized JSON text so reads go through the same parse path as a
/// real file and corrupt content can be simulated.
#[derive(Default)]
pub struct InMemorySettingsStorage {
    content: Mutex<Option<String>>,
}

impl InMemorySettingsStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw stored text
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(raw.into())),
        }
    }
}

impl SettingsStorage for InMemorySettingsStorage {
    fn exists(&self) -> bool {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn read_document(&self) -> Option<Settings> {
        let raw = self.read_raw()?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("Stored settings are not a valid JSON object: {e}");
                None
            }
        }
    }

    fn read_raw(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_document(&self, settings: &Settings) -> bool {
        match serde_json::to_string_pretty(settings) {
            Ok(json) => {
                *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
                true
            }
            Err(e) => {
                log::error!("Failed to serialize settings: {e}");
                false
            }
        }
    }
}
