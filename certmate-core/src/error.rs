//! Unified error type definition

use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Path resolves outside every allowed root
    #[error("Path traversal blocked: {0}")]
    PathTraversal(String),

    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Stored content is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Permission denied by the OS
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Storage layer error (disk full, I/O fault, lock timeout)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A field was rejected by its validator
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        let location = format!("{}: {err}", path.display());
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(location),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(location),
            _ => Self::StorageError(location),
        }
    }

    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::NotFound(_)
            | Self::ParseError(_)
            | Self::PathTraversal(_)
            | Self::ValidationError(_) => true,
            Self::PermissionDenied(_)
            | Self::StorageError(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_by_kind() {
        let path = Path::new("/data/settings.json");

        let err = CoreError::from_io(path, &io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CoreError::NotFound(_)));

        let err = CoreError::from_io(path, &io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, CoreError::PermissionDenied(_)));

        let err = CoreError::from_io(path, &io::Error::other("No space left on device"));
        assert!(matches!(err, CoreError::StorageError(ref msg) if msg.contains("No space")));
    }

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(CoreError::ValidationError("bad email".into())).unwrap();
        assert_eq!(json["code"], "ValidationError");
        assert_eq!(json["details"], "bad email");
    }
}
