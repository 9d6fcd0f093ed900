//! Discovery and creation of the `.tissue/` store directory.
//!
//! The store directory is the only persistent state: the JSONL log, the
//! derived cache, the lock file, and a `.gitignore` keeping the derived
//! artifacts out of version control. Discovery walks up from the working
//! directory; an explicit override and the `TISSUE_DIR` environment variable
//! bracket the walk in priority.

use std::fs;
use std::path::{Path, PathBuf};

/// The name of the store directory.
pub const STORE_DIR_NAME: &str = ".tissue";

/// Environment variable naming a store directory (lowest priority).
pub const STORE_DIR_ENV: &str = "TISSUE_DIR";

/// The durable log, versioned by the user's VCS.
pub const LOG_FILE_NAME: &str = "issues.jsonl";

/// The derived cache.
pub const DB_FILE_NAME: &str = "issues.db";

/// Empty file used solely as a cross-process advisory lock target.
pub const LOCK_FILE_NAME: &str = "lock";

/// Ignore-patterns written at init: everything derived or transient.
const GITIGNORE_CONTENTS: &str = "issues.db\nissues.db-shm\nissues.db-wal\nlock\n";

/// Errors from store-directory management.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `.tissue/` directory was found.
    #[error("no .tissue store directory found")]
    StoreDirNotFound,

    /// Directory or file creation failed.
    #[error("failed to create store layout: {0}")]
    Io(#[from] std::io::Error),
}

/// Walks up the directory tree from `start` looking for a `.tissue/` directory.
pub fn find_store_dir(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(STORE_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break, // Reached filesystem root.
        }
    }
    None
}

/// Resolves the store directory for a command.
///
/// Priority: explicit override > existing `.tissue/` found by walking upward
/// from `start` > `TISSUE_DIR` environment variable (absolute, or resolved
/// relative to `start`). Explicit and env paths are returned without an
/// existence check; opening the store reports the missing-store error.
pub fn resolve_store_dir(explicit: Option<&Path>, start: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(found) = find_store_dir(start) {
        return Some(found);
    }

    if let Ok(env_dir) = std::env::var(STORE_DIR_ENV) {
        if !env_dir.is_empty() {
            let env_path = PathBuf::from(&env_dir);
            return Some(if env_path.is_absolute() {
                env_path
            } else {
                start.join(env_path)
            });
        }
    }

    None
}

/// Creates the store layout at `dir`: the directory itself, an empty log,
/// the lock file, and the `.gitignore`.
///
/// Idempotent; an existing log is left untouched.
pub fn ensure_store_layout(dir: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(dir)?;

    let log_path = dir.join(LOG_FILE_NAME);
    if !log_path.exists() {
        fs::File::create(&log_path)?;
    }

    let lock_path = dir.join(LOCK_FILE_NAME);
    if !lock_path.exists() {
        fs::File::create(&lock_path)?;
    }

    fs::write(dir.join(".gitignore"), GITIGNORE_CONTENTS)?;
    Ok(())
}

/// Returns the raw string a default prefix is derived from: the basename of
/// the store directory's parent. Normalization happens in the store.
pub fn default_prefix_source(dir: &Path) -> Option<String> {
    dir.parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_store_dir_in_temp() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(STORE_DIR_NAME);
        fs::create_dir(&store).unwrap();

        let found = find_store_dir(dir.path()).unwrap();
        assert_eq!(
            found.canonicalize().unwrap(),
            store.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_find_store_dir_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(STORE_DIR_NAME);
        fs::create_dir(&store).unwrap();

        let child = dir.path().join("src").join("deep");
        fs::create_dir_all(&child).unwrap();

        let found = find_store_dir(&child).unwrap();
        assert_eq!(
            found.canonicalize().unwrap(),
            store.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_explicit_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(STORE_DIR_NAME);
        fs::create_dir(&store).unwrap();

        let explicit = dir.path().join("elsewhere");
        let resolved = resolve_store_dir(Some(&explicit), dir.path()).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_ensure_store_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(STORE_DIR_NAME);

        ensure_store_layout(&store).unwrap();

        assert!(store.join(LOG_FILE_NAME).is_file());
        assert!(store.join(LOCK_FILE_NAME).is_file());
        let gitignore = fs::read_to_string(store.join(".gitignore")).unwrap();
        assert!(gitignore.contains("issues.db"));
        assert!(gitignore.contains("issues.db-wal"));
        assert!(gitignore.contains("lock"));
    }

    #[test]
    fn test_ensure_store_layout_keeps_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(STORE_DIR_NAME);
        ensure_store_layout(&store).unwrap();
        fs::write(store.join(LOG_FILE_NAME), "{\"type\":\"issue\"}\n").unwrap();

        ensure_store_layout(&store).unwrap();
        let contents = fs::read_to_string(store.join(LOG_FILE_NAME)).unwrap();
        assert!(!contents.is_empty());
    }

    #[test]
    fn test_default_prefix_source_is_parent_basename() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("My Project");
        let store = project.join(STORE_DIR_NAME);
        fs::create_dir_all(&store).unwrap();

        assert_eq!(default_prefix_source(&store).as_deref(), Some("My Project"));
    }
}
