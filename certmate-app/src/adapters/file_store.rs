//! Locked, atomic file primitives.
//!
//! Reads take a shared advisory lock, writes an exclusive one. The lock lives on
//! a single `.certmate.lock` file per directory so it stays valid across the
//! rename that publishes a write. Readers never create it: a directory nothing
//! has been written to through the store is read unlocked. Writes go to a temp
//! file in the target's directory, are fsynced, restricted to the owner and
//! renamed into place.
//!
//! The infallible `read_*` / `write_*` methods absorb every error (reads return
//! the caller's default, writes return `false`); the `try_*` twins expose the
//! classified `CoreError`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use certmate_core::error::{CoreError, CoreResult};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PathGuard;

/// Default bound on lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-directory lock file shared by every target in that directory
pub const LOCK_FILE_NAME: &str = ".certmate.lock";

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock held until drop
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("Failed to release file lock: {e}");
        }
    }
}

/// Path-guarded file store.
#[derive(Debug, Clone)]
pub struct FileStore {
    guard: PathGuard,
    lock_timeout: Duration,
}

impl FileStore {
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self {
            guard,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Whether `path` is inside the allowed roots and names an existing file
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.guard
            .resolve(path)
            .is_ok_and(|target| target.is_file())
    }

    // ===== Reads =====

    /// Read and parse JSON, falling back to `default` on any failure
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>, default: T) -> T {
        let path = path.as_ref();
        self.try_read_json(path).unwrap_or_else(|e| {
            log_read_failure(path, &e);
            default
        })
    }

    /// Read text, falling back to `default` on any failure
    pub fn read_text(&self, path: impl AsRef<Path>, default: String) -> String {
        let path = path.as_ref();
        self.try_read_text(path).unwrap_or_else(|e| {
            log_read_failure(path, &e);
            default
        })
    }

    pub fn try_read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> CoreResult<T> {
        let path = path.as_ref();
        let content = self.try_read_text(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CoreError::ParseError(format!("{}: {e}", path.display())))
    }

    pub fn try_read_text(&self, path: impl AsRef<Path>) -> CoreResult<String> {
        let target = self.guard.resolve(path)?;
        if !target.exists() {
            return Err(CoreError::NotFound(target.display().to_string()));
        }

        let _lock = self.lock(&target, LockMode::Shared)?;
        fs::read_to_string(&target).map_err(|e| CoreError::from_io(&target, &e))
    }

    // ===== Writes =====

    /// Atomically write `value` as pretty JSON; `false` on any failure
    pub fn write_json<T: Serialize + ?Sized>(&self, path: impl AsRef<Path>, value: &T) -> bool {
        let path = path.as_ref();
        report_write(path, self.try_write_json(path, value))
    }

    /// Atomically write raw text; `false` on any failure
    pub fn write_text(&self, path: impl AsRef<Path>, text: &str) -> bool {
        let path = path.as_ref();
        report_write(path, self.try_write_text(path, text))
    }

    pub fn try_write_json<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        self.write_atomic(path.as_ref(), json.as_bytes())
    }

    pub fn try_write_text(&self, path: impl AsRef<Path>, text: &str) -> CoreResult<()> {
        self.write_atomic(path.as_ref(), text.as_bytes())
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> CoreResult<()> {
        let target = self.guard.resolve(path)?;
        let (parent, file_name) = match (target.parent(), target.file_name()) {
            (Some(parent), Some(name)) => (parent, name.to_string_lossy().into_owned()),
            _ => {
                return Err(CoreError::StorageError(format!(
                    "Not a file path: {}",
                    target.display()
                )))
            }
        };
        if file_name == LOCK_FILE_NAME {
            return Err(CoreError::StorageError(format!(
                "Refusing to overwrite lock file {}",
                target.display()
            )));
        }
        fs::create_dir_all(parent).map_err(|e| CoreError::from_io(parent, &e))?;

        let _lock = self.lock(&target, LockMode::Exclusive)?;

        // Removed on drop unless persisted
        let mut temp_file = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| CoreError::from_io(parent, &e))?;
        let temp_path = temp_file.path().to_path_buf();

        temp_file
            .write_all(contents)
            .and_then(|()| temp_file.flush())
            .and_then(|()| temp_file.as_file().sync_all())
            .map_err(|e| CoreError::from_io(&temp_path, &e))?;
        restrict_to_owner(&temp_path).map_err(|e| CoreError::from_io(&temp_path, &e))?;

        temp_file
            .persist(&target)
            .map_err(|e| CoreError::from_io(&target, &e.error))?;
        sync_dir(parent);

        log::debug!("Wrote {} bytes to {}", contents.len(), target.display());
        Ok(())
    }

    // ===== Locking =====

    /// Lock the directory holding `target`.
    ///
    /// `None` for a shared lock when the lock file does not exist yet.
    fn lock(&self, target: &Path, mode: LockMode) -> CoreResult<Option<FileLock>> {
        let lock_path = lock_path_for(target);
        let opened = match mode {
            LockMode::Shared => OpenOptions::new().read(true).open(&lock_path),
            LockMode::Exclusive => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path),
        };
        let file = match opened {
            Ok(file) => file,
            Err(e) if mode == LockMode::Shared && e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No lock file at {}, reading unlocked", lock_path.display());
                return Ok(None);
            }
            Err(e) => return Err(CoreError::from_io(&lock_path, &e)),
        };

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match attempt {
                Ok(()) => return Ok(Some(FileLock { file })),
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        return Err(CoreError::StorageError(format!(
                            "Timed out after {:?} waiting for {mode:?} lock on {}",
                            self.lock_timeout,
                            target.display()
                        )));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(CoreError::from_io(&lock_path, &e)),
            }
        }
    }
}

fn lock_path_for(target: &Path) -> PathBuf {
    target.with_file_name(LOCK_FILE_NAME)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Persist the rename itself; best effort
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        log::debug!("Failed to sync directory {}: {e}", dir.display());
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

fn log_read_failure(path: &Path, err: &CoreError) {
    match err {
        CoreError::NotFound(_) => log::debug!("Read {}: {err}", path.display()),
        e if e.is_expected() => log::warn!("Read {} failed, using default: {err}", path.display()),
        _ => log::error!("Read {} failed, using default: {err}", path.display()),
    }
}

fn report_write(path: &Path, result: CoreResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_expected() => {
            log::warn!("Write {} failed: {e}", path.display());
            false
        }
        Err(e) => {
            log::error!("Write {} failed: {e}", path.display());
            false
        }
    }
}
