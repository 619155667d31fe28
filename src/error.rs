//! Crate-wide error taxonomy.
//!
//! Every fallible operation in `pf`, `rbf`, and `ix` returns
//! `Result<T, StorageError>`. Variants are grouped the way the three layers
//! group their own failure modes; none of them are retried internally —
//! callers decide what to do with a propagated error.

use std::path::PathBuf;

/// Errors produced by the paged-file, record-file, and index layers.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    // -- Paged file (PF) --
    #[error("file already exists: {0}")]
    FileExists(PathBuf),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("cannot seek to page {page} of {path}: {source}")]
    Locate {
        path: PathBuf,
        page: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("short read at page {page} of {path}: expected {expected} bytes, got {got}")]
    ShortRead {
        path: PathBuf,
        page: u32,
        expected: usize,
        got: usize,
    },

    #[error("short write at page {page} of {path}")]
    ShortWrite { path: PathBuf, page: u32 },

    #[error("null or empty buffer passed to {0}")]
    NullBuffer(&'static str),

    #[error("file {0} size is not a multiple of the page size (corrupt)")]
    NotPageAligned(PathBuf),

    #[error("page {page} is out of range (file has {page_count} pages)")]
    OutOfRange { page: u32, page_count: u32 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -- Record file (RF) / slotted page (SP) --
    #[error("bad file handle")]
    BadHandle,

    #[error("corrupted page data: {0}")]
    BadData(String),

    #[error("record of {size} bytes exceeds page capacity ({capacity} bytes)")]
    SizeTooLarge { size: usize, capacity: usize },

    #[error("record not found")]
    RecordNotFound,

    #[error("attribute not found: {0}")]
    AttrNotFound(String),

    #[error("no free-space map entry for page {0}")]
    MapEntryNotFound(u32),

    // -- Index (LHX) --
    #[error("initial bucket count must be a power of two, got {0}")]
    InvalidInitialBucketCount(u32),

    #[error("bad page: impossible bucket routing ({0})")]
    BadPage(String),

    #[error("bucket {bucket} out of bound (N={n}, p={p})")]
    OutOfBound { bucket: u32, n: u32, p: u32 },

    #[error("index metadata was never initialized")]
    MetadataMissing,

    #[error("index metadata is inconsistent: {0}")]
    MetadataError(String),

    #[error("page has no room for the entry")]
    NoSpace,

    #[error("entry not found")]
    EntryNotFound,

    #[error("duplicate entry")]
    DuplicateEntry,

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type Result<T> = std::result::Result<T, StorageError>;
