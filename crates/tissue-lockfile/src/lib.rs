//! Cross-process advisory locking over the store's `lock` file.
//!
//! Writers hold an exclusive lock across the append + fsync + watermark
//! sequence; readers doing incremental import hold a shared lock while they
//! read the log tail. Locks are advisory: every process touching the store
//! must go through this crate.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Errors that can occur while locking.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock file could not be opened or created.
    #[error("failed to open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A lock could not be acquired.
    #[error("failed to acquire {mode} lock on {path}: {source}")]
    Acquire {
        mode: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, LockError>;

/// Handle to a store's lock file.
///
/// The file carries no content; it exists solely as a lock target.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Opens the lock file at `path`, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { file, path })
    }

    /// Blocks until an exclusive lock is held. Released when the guard drops.
    pub fn lock_exclusive(&self) -> Result<LockGuard<'_>> {
        fs2::FileExt::lock_exclusive(&self.file).map_err(|source| LockError::Acquire {
            mode: "exclusive",
            path: self.path.clone(),
            source,
        })?;
        Ok(LockGuard { file: &self.file })
    }

    /// Blocks until a shared lock is held. Released when the guard drops.
    pub fn lock_shared(&self) -> Result<LockGuard<'_>> {
        fs2::FileExt::lock_shared(&self.file).map_err(|source| LockError::Acquire {
            mode: "shared",
            path: self.path.clone(),
            source,
        })?;
        Ok(LockGuard { file: &self.file })
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// RAII guard; unlocks on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    file: &'a File,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Unlock failures on drop are unreportable; the OS releases the lock
        // when the descriptor closes anyway.
        let _ = fs2::FileExt::unlock(self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let lock = LockFile::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path);
    }

    #[test]
    fn exclusive_then_shared_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockFile::open(dir.path().join("lock")).unwrap();

        let guard = lock.lock_exclusive().unwrap();
        drop(guard);

        // Must be reacquirable immediately after release.
        let _shared = lock.lock_shared().unwrap();
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let a = LockFile::open(&path).unwrap();
        let b = LockFile::open(&path).unwrap();

        let _ga = a.lock_shared().unwrap();
        let _gb = b.lock_shared().unwrap();
    }

    #[test]
    fn reopen_existing_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        drop(LockFile::open(&path).unwrap());
        let lock = LockFile::open(&path).unwrap();
        let _guard = lock.lock_exclusive().unwrap();
    }

    #[test]
    fn exclusive_holder_blocks_second_locker_until_release() {
        use std::sync::mpsc;
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");

        let holder = LockFile::open(&path).unwrap();
        let guard = holder.lock_exclusive().unwrap();

        let (tx, rx) = mpsc::channel();
        let contender_path = path.clone();
        let contender = std::thread::spawn(move || {
            let lock = LockFile::open(&contender_path).unwrap();
            // Blocks here until the holder releases.
            let _guard = lock.lock_exclusive().unwrap();
            tx.send(()).unwrap();
        });

        // The contender must still be waiting, not failed.
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        drop(guard);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        contender.join().unwrap();
    }
}
