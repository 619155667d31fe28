//! Free-space directory (FSD): per-open-file map from free-byte count to the
//! set of pages with that much room, used to pick an insertion site without
//! scanning the file.
//!
//! The directory never tries to pack records onto pages — it only ever
//! answers "is there *some* page with at least this much room". Packing is
//! `reorganize_page`'s job (`rbf::manager`).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Result;
use crate::pf::FileHandle;

use super::page;

/// Owns one free-byte -> page-numbers map per open file, keyed by the file's
/// path (used as an opaque file identity, not a record key — see
/// `SPEC_FULL.md` §4.2 on why this is not the stringified-key antipattern
/// `spec.md` §9 warns against).
#[derive(Default)]
pub struct FreeSpaceDirectory {
    files: HashMap<String, BTreeMap<u16, BTreeSet<u32>>>,
}

impl FreeSpaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every page of `handle` once and populates the map for `key`.
    pub fn buffer_on_open(&mut self, key: &str, handle: &mut FileHandle) -> Result<()> {
        let mut map = BTreeMap::new();
        let page_count = handle.page_count()?;
        let mut buf = vec![0u8; crate::pf::PAGE_SIZE];
        for page_no in 0..page_count {
            handle.read_page(page_no, &mut buf)?;
            let free = page::free_space(&buf) as u16;
            map.entry(free).or_insert_with(BTreeSet::new).insert(page_no);
        }
        self.files.insert(key.to_string(), map);
        Ok(())
    }

    /// Finds a page with at least `size` free bytes and removes it from the
    /// map (the caller is expected to re-`insert` it at its new free count
    /// once the write lands). Picks the smallest sufficient bucket, reading
    /// the map before mutating it (no iterator invalidation).
    pub fn allocate(&mut self, key: &str, size: u16) -> Option<u32> {
        let map = self.files.get_mut(key)?;
        let bucket_key = *map.range(size..).next()?.0;
        let bucket = map.get_mut(&bucket_key).expect("bucket key came from this map");
        let page_no = *bucket.iter().next().expect("non-empty bucket");
        bucket.remove(&page_no);
        if bucket.is_empty() {
            map.remove(&bucket_key);
        }
        Some(page_no)
    }

    /// Moves `page` from its `old_free` bucket to its `new_free` bucket.
    pub fn update(&mut self, key: &str, page_no: u32, old_free: u16, new_free: u16) {
        self.remove(key, page_no, old_free);
        self.insert(key, page_no, new_free);
    }

    /// Adds `page` to the `free`-byte bucket.
    pub fn insert(&mut self, key: &str, page_no: u32, free: u16) {
        self.files
            .entry(key.to_string())
            .or_default()
            .entry(free)
            .or_insert_with(BTreeSet::new)
            .insert(page_no);
    }

    fn remove(&mut self, key: &str, page_no: u32, free: u16) {
        if let Some(map) = self.files.get_mut(key) {
            if let Some(bucket) = map.get_mut(&free) {
                bucket.remove(&page_no);
                if bucket.is_empty() {
                    map.remove(&free);
                }
            }
        }
    }

    /// Drops the directory entry for `key` (called on file close).
    pub fn clear(&mut self, key: &str) {
        self.files.remove(key);
    }
}
