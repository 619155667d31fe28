//! Storage and indexing core for a disk-based relational engine.
//!
//! Three layers, each routing its I/O through the one below:
//!
//! - [`pf`] — paged file I/O: fixed `4096`-byte pages, create/destroy/open/close,
//!   read/write/append with per-handle counters.
//! - [`rbf`] — variable-length records on slotted pages, with an in-memory
//!   free-space directory for O(log n) insertion-site selection and
//!   forwarding-pointer migration on growth.
//! - [`ix`] — a linear-hashing index over a pair of paged files (primary
//!   buckets + overflow chain), growing one bucket at a time via controlled
//!   splits and shrinking the same way on delete.
//!
//! # Quick example
//!
//! ```no_run
//! use reldb_core::rbf::{RecordFileManager, Attribute, FieldValue};
//!
//! let mut rfm = RecordFileManager::new();
//! rfm.create("accounts.tbl").unwrap();
//! let mut handle = rfm.open("accounts.tbl").unwrap();
//!
//! let schema = vec![Attribute::int("id"), Attribute::real("balance")];
//! let rid = rfm
//!     .insert(&mut handle, &schema, &[FieldValue::Int(1), FieldValue::Real(42.5)])
//!     .unwrap();
//!
//! let bytes = rfm.read(&mut handle, rid).unwrap();
//! assert_eq!(bytes.len(), 8);
//! rfm.close(handle).unwrap();
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pf`] | Fixed-size page I/O over a single file |
//! | [`rbf::page`] | Slotted-page binary layout and slot-state decoding |
//! | [`rbf::freespace`] | Free-byte-count to page-number directory |
//! | [`rbf::record`] | Attribute/record encoding |
//! | [`rbf::manager`] | Insert/read/update/delete/reorganize over a record file |
//! | [`rbf::scan`] | Filtered, projected record scans |
//! | [`ix::keyvalue`] | Typed, comparable, hashable index key |
//! | [`ix::metadata`] | The index's singleton header page |
//! | [`ix::datapage`] | In-memory bucket-chain page |
//! | [`ix::manager`] | Insert-with-split / delete-with-shrink / bucket addressing |
//! | [`ix::scan`] | Point and range scans over an index |
//!
//! Install the `recordctl` binary (`cli` feature, on by default) to drive
//! these layers from the command line — see the [`cli`] module.

pub mod cli;
pub mod error;
pub mod ix;
pub mod pf;
pub mod rbf;
pub mod util;

pub use error::{Result, StorageError};
