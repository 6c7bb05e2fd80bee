//! The boundary with the filesystem.
//!
//! The registry never touches the disk directly: it asks a [`FileStore`] to
//! prepare directories, check for and remove files, and move a finished
//! transfer into its final location. [`LocalFileStore`] is the default
//! implementation on top of `std::fs`.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Filesystem operations needed by the registry.
pub trait FileStore: Send + Sync {
    /// Create `path` and its parents if they do not exist.
    fn ensure_directory(&self, path: &Path) -> io::Result<()>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Remove the file at `path`. Returns `false` if nothing was removed.
    fn delete(&self, path: &Path) -> bool;

    /// Move a finished transfer from `from` to `to`, replacing any file there.
    fn move_to_final_location(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileStore`] on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    /// Creates a new [`LocalFileStore`].
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for LocalFileStore {
    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        debug!("Creating destination directory {:?}", path);
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to delete {:?}: {}", path, e);
                false
            }
        }
    }

    fn move_to_final_location(&self, from: &Path, to: &Path) -> io::Result<()> {
        if from == to {
            return Ok(());
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        if to.exists() {
            fs::remove_file(to)?;
        }
        debug!("Moving {:?} to {:?}", from, to);
        if fs::rename(from, to).is_err() {
            // Crossing filesystems.
            fs::copy(from, to)?;
            fs::remove_file(from)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = LocalFileStore::new();

        store.ensure_directory(&nested).unwrap();
        store.ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_exists_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.bin");
        let store = LocalFileStore::new();

        assert!(!store.exists(&file));
        assert!(!store.delete(&file));

        fs::write(&file, b"data").unwrap();
        assert!(store.exists(&file));
        assert!(store.delete(&file));
        assert!(!store.exists(&file));
    }

    #[test]
    fn test_directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!LocalFileStore::new().exists(dir.path()));
    }

    #[test]
    fn test_move_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("file.part");
        let to = dir.path().join("sub").join("file.bin");
        let store = LocalFileStore::new();

        fs::write(&from, b"new").unwrap();
        store.ensure_directory(to.parent().unwrap()).unwrap();
        fs::write(&to, b"old").unwrap();

        store.move_to_final_location(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let result =
            store.move_to_final_location(&dir.path().join("missing"), &dir.path().join("to"));
        assert!(result.is_err());
    }
}
