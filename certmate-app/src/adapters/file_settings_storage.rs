//! File-backed `SettingsStorage`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use certmate_core::traits::SettingsStorage;
use certmate_core::types::Settings;

use super::FileStore;

/// Stores the settings document as a single JSON file through a `FileStore`.
pub struct FileSettingsStorage {
    store: Arc<FileStore>,
    path: PathBuf,
}

impl FileSettingsStorage {
    pub fn new(store: Arc<FileStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorage for FileSettingsStorage {
    fn exists(&self) -> bool {
        self.store.exists(&self.path)
    }

    fn read_document(&self) -> Option<Settings> {
        self.store.read_json(&self.path, None)
    }

    fn read_raw(&self) -> Option<String> {
        match self.store.try_read_text(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                log::warn!("Failed to read raw settings: {e}");
                None
            }
        }
    }

    fn write_document(&self, settings: &Settings) -> bool {
        self.store.write_json(&self.path, settings)
    }
}
