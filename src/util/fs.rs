//! File-naming helpers for tables and indexes.
//!
//! A table named `X` lives in a single record file `X.tbl`. An index named
//! `X` is backed by two paged files, `X.pp` (primary buckets) and `X.op`
//! (overflow pages plus the metadata page), per `spec.md` §6.

use std::path::PathBuf;

pub fn table_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.tbl"))
}

pub fn index_primary_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.pp"))
}

pub fn index_overflow_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.op"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_path_appends_tbl_suffix() {
        assert_eq!(table_path("accounts"), PathBuf::from("accounts.tbl"));
    }

    #[test]
    fn index_paths_append_pp_and_op_suffixes() {
        assert_eq!(index_primary_path("by_age"), PathBuf::from("by_age.pp"));
        assert_eq!(index_overflow_path("by_age"), PathBuf::from("by_age.op"));
    }
}
