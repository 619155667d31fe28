use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{Result, StorageError};

use super::handle::FileHandle;

/// Creates, destroys, and opens paged files.
///
/// Stateless by design — unlike the course-project original this is not a
/// process-wide singleton; callers construct one (or just call the
/// associated functions) wherever they need file-level operations.
pub struct PagedFileManager;

impl PagedFileManager {
    /// Creates a zero-length file. Fails if `name` already exists.
    pub fn create(name: impl AsRef<Path>) -> Result<()> {
        let path = name.as_ref();
        if path.exists() {
            return Err(StorageError::FileExists(path.to_path_buf()));
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| StorageError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "created paged file");
        Ok(())
    }

    /// Removes a file. Fails if it does not exist.
    pub fn destroy(name: impl AsRef<Path>) -> Result<()> {
        let path = name.as_ref();
        if !path.exists() {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }
        fs::remove_file(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "destroyed paged file");
        Ok(())
    }

    /// Opens a read/write handle on an existing file.
    pub fn open(name: impl AsRef<Path>) -> Result<FileHandle> {
        let path = name.as_ref();
        if !path.exists() {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| StorageError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        FileHandle::new(path.to_path_buf(), file)
    }

    /// Closes a handle (consumes it; the underlying fd closes on drop).
    pub fn close(_handle: FileHandle) -> Result<()> {
        Ok(())
    }
}
