//! CertMate Core Library
//!
//! Provides the platform-independent settings logic for the certificate manager, including:
//! - Settings document model and defaults
//! - Multi-account DNS provider migration (Migration Service)
//! - Validated, backed-up settings persistence (Settings Service)
//! - API token policy and secure token generation
//!
//! This library does not touch the filesystem; storage, backups and token
//! generation are injected through traits.

pub mod crypto;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{MigrationService, ServiceContext, SettingsService};
pub use traits::{BackupHook, SettingsStorage, TokenGenerator, Validator};
pub use types::{Settings, TokenPolicy};
