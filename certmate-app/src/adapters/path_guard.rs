//! Allowed-root path sandbox.
//!
//! Every filesystem access made by the adapters is resolved through
//! [`PathGuard::resolve`] first. Resolution follows symlinks and `..`
//! segments on the real filesystem, so a link inside a root that points
//! outside of it is rejected just like a literal `/etc/passwd`.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use certmate_core::error::{CoreError, CoreResult};

/// Immutable set of canonical allowed roots.
#[derive(Debug, Clone)]
pub struct PathGuard {
    roots: Arc<[PathBuf]>,
}

impl PathGuard {
    /// Build a guard from absolute, existing directories.
    ///
    /// # Errors
    /// `CoreError::ConfigError` if the set is empty or a root is relative or
    /// cannot be canonicalized.
    pub fn new<I, P>(roots: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut canonical_roots = Vec::new();
        for root in roots {
            let root = root.as_ref();
            if !root.is_absolute() {
                return Err(CoreError::ConfigError(format!(
                    "Allowed root must be absolute: {}",
                    root.display()
                )));
            }
            let canonical = fs::canonicalize(root).map_err(|e| {
                CoreError::ConfigError(format!(
                    "Failed to canonicalize allowed root {}: {e}",
                    root.display()
                ))
            })?;
            if !canonical_roots.contains(&canonical) {
                canonical_roots.push(canonical);
            }
        }
        if canonical_roots.is_empty() {
            return Err(CoreError::ConfigError(
                "At least one allowed root is required".to_string(),
            ));
        }
        Ok(Self {
            roots: canonical_roots.into(),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve `path` to its canonical form inside an allowed root.
    ///
    /// Components that do not exist yet are appended lexically, so targets of
    /// future writes can be checked. The root directories themselves are not
    /// valid targets.
    pub fn resolve(&self, path: impl AsRef<Path>) -> CoreResult<PathBuf> {
        let path = path.as_ref();
        let resolved = resolve_on_disk(path).map_err(|e| {
            CoreError::PathTraversal(format!("{}: {e}", path.display()))
        })?;

        if self
            .roots
            .iter()
            .any(|root| resolved != *root && resolved.starts_with(root))
        {
            Ok(resolved)
        } else {
            log::warn!(
                "Blocked access outside allowed roots: {} -> {}",
                path.display(),
                resolved.display()
            );
            Err(CoreError::PathTraversal(path.display().to_string()))
        }
    }

    pub fn is_allowed(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_ok()
    }
}

/// Canonicalize as much of `path` as exists, walking one component at a time.
fn resolve_on_disk(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                match fs::canonicalize(&resolved) {
                    Ok(canonical) => resolved = canonical,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        // A link whose target is missing still points somewhere
                        if fs::symlink_metadata(&resolved).is_ok() {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidInput,
                                "dangling symlink",
                            ));
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}
