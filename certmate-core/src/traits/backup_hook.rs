//! Backup collaborator abstraction Trait

/// Backup hook invoked with the prior settings content before it is overwritten.
///
/// Retention and rotation belong to the implementation, not to the caller.
/// Use `NoopBackupHook` if no backup is needed.
pub trait BackupHook: Send + Sync {
    /// Back up `raw` (the current stored document).
    ///
    /// `reason` labels why the overwrite happens (`"manual"`, `"migration"`, ...).
    /// Returns a backup identifier (e.g., file path) or `None` if nothing was written.
    fn backup(&self, _raw: &str, _reason: &str) -> Option<String> {
        None
    }
}

/// No-op backup hook.
pub struct NoopBackupHook;

impl BackupHook for NoopBackupHook {}
