//! Filesystem adapters: path sandbox, atomic file store, and the settings
//! storage / backup implementations built on top of it.

mod file_backup_hook;
mod file_settings_storage;
mod file_store;
mod path_guard;

pub use file_backup_hook::FileBackupHook;
pub use file_settings_storage::FileSettingsStorage;
pub use file_store::{FileStore, DEFAULT_LOCK_TIMEOUT, LOCK_FILE_NAME};
pub use path_guard::PathGuard;
