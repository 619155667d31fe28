//! The index's metadata page: a singleton header stored in page 0 of the
//! overflow file, holding the counters that drive bucket addressing and
//! controlled split/shrink.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};
use crate::pf::{FileHandle, PAGE_SIZE};

const METADATA_PAGE: u32 = 0;
const WORD: usize = 4;
const FIELD_COUNT: usize = 7;

/// In-memory view of the overflow file's page 0: seven 32-bit unsigned
/// words, in order, starting at byte 0 (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct MetadataPage {
    pub entry_count: u32,
    pub primary_page_count: u32,
    pub overflow_page_count: u32,
    pub deleted_overflow_page_count: u32,
    pub n: u32,
    pub p: u32,
    pub n_initial: u32,
    dirty: bool,
}

impl MetadataPage {
    pub fn new(n_initial: u32) -> Self {
        MetadataPage {
            entry_count: 0,
            primary_page_count: n_initial,
            overflow_page_count: 0,
            deleted_overflow_page_count: 0,
            n: n_initial,
            p: 0,
            n_initial,
            dirty: true,
        }
    }

    pub fn load(handle: &mut FileHandle) -> Result<Self> {
        let mut buf = vec![0u8; PAGE_SIZE];
        handle.read_page(METADATA_PAGE, &mut buf)?;
        let mut words = [0u32; FIELD_COUNT];
        for (i, w) in words.iter_mut().enumerate() {
            *w = LittleEndian::read_u32(&buf[i * WORD..]);
        }
        Ok(MetadataPage {
            entry_count: words[0],
            primary_page_count: words[1],
            overflow_page_count: words[2],
            deleted_overflow_page_count: words[3],
            n: words[4],
            p: words[5],
            n_initial: words[6],
            dirty: false,
        })
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn flush(&mut self, handle: &mut FileHandle) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut buf = vec![0u8; PAGE_SIZE];
        let words = [
            self.entry_count,
            self.primary_page_count,
            self.overflow_page_count,
            self.deleted_overflow_page_count,
            self.n,
            self.p,
            self.n_initial,
        ];
        for (i, w) in words.iter().enumerate() {
            LittleEndian::write_u32(&mut buf[i * WORD..], *w);
        }
        if handle.page_count()? == METADATA_PAGE {
            handle.append_page(&buf)?;
        } else {
            handle.write_page(METADATA_PAGE, &buf)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Sanity-checks the counters after a load; `spec.md` §7's
    /// `MetadataError` condition.
    pub fn validate(&self) -> Result<()> {
        if self.p >= self.n || self.primary_page_count < self.n {
            return Err(StorageError::MetadataError(format!(
                "inconsistent counters: n={}, p={}, primary_page_count={}",
                self.n, self.p, self.primary_page_count
            )));
        }
        Ok(())
    }
}

impl Drop for MetadataPage {
    fn drop(&mut self) {
        debug_assert!(!self.dirty, "MetadataPage dropped dirty without flush");
    }
}
