//! Secure token generator abstraction Trait

/// Produces fresh API bearer tokens.
///
/// Implementations must return tokens of at least 32 characters that pass the
/// configured `TokenPolicy`.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}
