//! CLI subcommand implementations for the `recordctl` binary.
//!
//! Mirrors the library's two storage layers directly: `table` subcommands
//! drive [`crate::rbf::RecordFileManager`], `index` subcommands drive
//! [`crate::ix::HashIndex`]. Each module follows the same shape as the rest
//! of this crate's CLI surface: an `Options` struct holding parsed arguments
//! and `pub fn execute(opts, writer) -> Result<(), StorageError>`, so output
//! can be captured in tests or redirected via the global `--output` flag.

pub mod app;
pub mod index;
pub mod table;

use std::io::Write;

use crate::error::StorageError;

macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::error::StorageError::Io {
            path: std::path::PathBuf::new(),
            source: e,
        })
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::error::StorageError::Io {
            path: std::path::PathBuf::new(),
            source: e,
        })
    };
}

pub(crate) use wprintln;

pub(crate) fn io_err(source: std::io::Error) -> StorageError {
    StorageError::Io { path: std::path::PathBuf::new(), source }
}

pub(crate) fn open_writer(output: &Option<String>) -> Result<Box<dyn Write>, StorageError> {
    match output {
        Some(path) => std::fs::File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(io_err),
        None => Ok(Box::new(std::io::stdout())),
    }
}
