//! Collaborator abstraction trait definition

mod backup_hook;
mod settings_storage;
mod token_generator;
mod validator;

pub use backup_hook::{BackupHook, NoopBackupHook};
pub use settings_storage::{InMemorySettingsStorage, SettingsStorage};
pub use token_generator::TokenGenerator;
pub use validator::Validator;
