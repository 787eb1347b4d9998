//! Field validator abstraction Trait

use crate::error::CoreResult;

/// Validator Trait
///
/// One implementation per field type. On success returns the normalized value
/// to store; on rejection returns `CoreError::ValidationError` carrying the
/// human-readable reason.
pub trait Validator: Send + Sync {
    fn validate(&self, input: &str) -> CoreResult<String>;
}
