//! Timestamped settings backups.
//!
//! Writes each backup as its own file in the backup directory. Rotation and
//! retention are left to operators.

use std::path::PathBuf;
use std::sync::Arc;

use certmate_core::traits::BackupHook;

use super::FileStore;

/// Backup hook writing `settings_<UTC timestamp>_<reason>.json` files.
pub struct FileBackupHook {
    store: Arc<FileStore>,
    backup_dir: PathBuf,
}

impl FileBackupHook {
    pub fn new(store: Arc<FileStore>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            backup_dir: backup_dir.into(),
        }
    }

    fn next_path(&self, reason: &str) -> PathBuf {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let reason = sanitize_reason(reason);
        let mut candidate = self
            .backup_dir
            .join(format!("settings_{timestamp}_{reason}.json"));
        let mut counter = 1;
        while self.store.exists(&candidate) {
            candidate = self
                .backup_dir
                .join(format!("settings_{timestamp}_{reason}_{counter}.json"));
            counter += 1;
        }
        candidate
    }
}

impl BackupHook for FileBackupHook {
    fn backup(&self, raw: &str, reason: &str) -> Option<String> {
        let path = self.next_path(reason);
        if !self.store.write_text(&path, raw) {
            log::warn!("Failed to write settings backup: {}", path.display());
            return None;
        }
        let path_str = path.display().to_string();
        log::debug!("Wrote settings backup: {path_str}");
        Some(path_str)
    }
}

/// Keep file names portable: `[A-Za-z0-9_-]`, anything else becomes `_`
fn sanitize_reason(reason: &str) -> String {
    let cleaned: String = reason
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unspecified".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_reason() {
        assert_eq!(sanitize_reason("manual"), "manual");
        assert_eq!(sanitize_reason("../../etc"), "______etc");
        assert_eq!(sanitize_reason(""), "unspecified");
    }
}
