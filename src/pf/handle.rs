use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};

use super::PAGE_SIZE;

/// An open paged file. Exclusively owns its OS file descriptor; dropping it
/// closes the file via the OS default (no I/O happens on drop — see
/// `DESIGN.md` on destructors-as-recovery-points).
pub struct FileHandle {
    path: PathBuf,
    file: File,
    read_count: u32,
    write_count: u32,
    append_count: u32,
}

impl FileHandle {
    pub(super) fn new(path: PathBuf, file: File) -> Result<Self> {
        let handle = FileHandle {
            path,
            file,
            read_count: 0,
            write_count: 0,
            append_count: 0,
        };
        handle.check_alignment()?;
        Ok(handle)
    }

    fn check_alignment(&self) -> Result<()> {
        let len = self
            .file
            .metadata()
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?
            .len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::NotPageAligned(self.path.clone()));
        }
        Ok(())
    }

    /// Path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of whole pages currently in the file.
    pub fn page_count(&self) -> Result<u32> {
        let len = self
            .file
            .metadata()
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?
            .len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::NotPageAligned(self.path.clone()));
        }
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Reads exactly `PAGE_SIZE` bytes from page `page_no` into `buf`.
    pub fn read_page(&mut self, page_no: u32, buf: &mut [u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::NullBuffer("read_page"));
        }
        let page_count = self.page_count()?;
        if page_no >= page_count {
            return Err(StorageError::OutOfRange { page: page_no, page_count });
        }
        let offset = page_no as u64 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| StorageError::Locate {
                path: self.path.clone(),
                page: page_no,
                source,
            })?;
        let got = self
            .file
            .read(buf)
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        if got != PAGE_SIZE {
            return Err(StorageError::ShortRead {
                path: self.path.clone(),
                page: page_no,
                expected: PAGE_SIZE,
                got,
            });
        }
        self.read_count += 1;
        Ok(())
    }

    /// Writes exactly `PAGE_SIZE` bytes to page `page_no`.
    ///
    /// Writing at `page_no == page_count` appends and counts as an append;
    /// any smaller page number counts as a write.
    pub fn write_page(&mut self, page_no: u32, buf: &[u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::NullBuffer("write_page"));
        }
        let page_count = self.page_count()?;
        if page_no > page_count {
            return Err(StorageError::OutOfRange { page: page_no, page_count });
        }
        if page_no == page_count {
            return self.append_page(buf);
        }
        let offset = page_no as u64 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| StorageError::Locate {
                path: self.path.clone(),
                page: page_no,
                source,
            })?;
        self.file.write_all(buf).map_err(|_| StorageError::ShortWrite {
            path: self.path.clone(),
            page: page_no,
        })?;
        self.write_count += 1;
        Ok(())
    }

    /// Appends one page to the end of the file.
    pub fn append_page(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::NullBuffer("append_page"));
        }
        let page_count = self.page_count()?;
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|source| StorageError::Locate {
                path: self.path.clone(),
                page: page_count,
                source,
            })?;
        self.file.write_all(buf).map_err(|_| StorageError::ShortWrite {
            path: self.path.clone(),
            page: page_count,
        })?;
        self.append_count += 1;
        Ok(())
    }

    /// Per-handle monotonically increasing (read, write, append) counters.
    /// Not persisted; reset when the handle is dropped.
    pub fn counters(&self) -> (u32, u32, u32) {
        (self.read_count, self.write_count, self.append_count)
    }
}
