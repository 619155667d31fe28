//! Linear-hashing index manager: owns the primary/overflow file pair for one
//! index and implements insert-with-controlled-split, delete-with-controlled-shrink,
//! and scan.

use tracing::debug;

use crate::error::{Result, StorageError};
use crate::pf::{FileHandle, PagedFileManager};
use crate::rbf::{AttrKind, Rid};

use crate::util::fs::{index_overflow_path, index_primary_path};

use super::datapage::{DataPage, PageType, PAGE_END};
use super::keyvalue::KeyValue;
use super::metadata::MetadataPage;
use super::scan::IndexScan;

/// A bucket chain loaded into memory: one primary page followed by zero or
/// more overflow pages, in `next` order.
struct Chain {
    bucket_no: u32,
    pages: Vec<DataPage>,
}

impl Chain {
    fn is_empty(&self) -> bool {
        self.pages.iter().all(DataPage::is_empty)
    }

    fn contains(&self, key: &KeyValue, rid: Rid) -> bool {
        self.pages.iter().any(|p| p.contains(key, rid))
    }

    fn page_with_space(&mut self, key: &KeyValue) -> Option<&mut DataPage> {
        self.pages.iter_mut().find(|p| p.has_space(key))
    }
}

/// Owns the two paged files backing one linear-hashing index.
pub struct HashIndex {
    name: String,
    primary: FileHandle,
    overflow: FileHandle,
    key_type: AttrKind,
    metadata: MetadataPage,
    grown: bool,
}

impl HashIndex {
    pub fn create(name: &str, initial_buckets: u32) -> Result<()> {
        if initial_buckets == 0 || !initial_buckets.is_power_of_two() {
            return Err(StorageError::InvalidInitialBucketCount(initial_buckets));
        }
        PagedFileManager::create(index_primary_path(name))?;
        PagedFileManager::create(index_overflow_path(name))?;
        let mut overflow = PagedFileManager::open(index_overflow_path(name))?;
        let mut meta = MetadataPage::new(initial_buckets);
        meta.mark_dirty();
        meta.flush(&mut overflow)?;
        PagedFileManager::close(overflow)?;
        debug!(name, initial_buckets, "created linear-hash index");
        Ok(())
    }

    pub fn destroy(name: &str) -> Result<()> {
        PagedFileManager::destroy(index_primary_path(name))?;
        PagedFileManager::destroy(index_overflow_path(name))?;
        Ok(())
    }

    pub fn open(name: &str, key_type: AttrKind) -> Result<Self> {
        let primary = PagedFileManager::open(index_primary_path(name))?;
        let mut overflow = PagedFileManager::open(index_overflow_path(name))?;
        let metadata = MetadataPage::load(&mut overflow)?;
        metadata.validate()?;
        Ok(HashIndex {
            name: name.to_string(),
            primary,
            overflow,
            key_type,
            metadata,
            grown: false,
        })
    }

    pub fn close(mut self) -> Result<()> {
        self.metadata.flush(&mut self.overflow)?;
        PagedFileManager::close(self.primary)?;
        PagedFileManager::close(self.overflow)?;
        Ok(())
    }

    pub fn num_primary_pages(&self) -> u32 {
        self.metadata.primary_page_count
    }

    pub fn num_all_pages(&self) -> u32 {
        self.metadata.primary_page_count
            + (self.metadata.overflow_page_count - self.metadata.deleted_overflow_page_count)
            + 1
    }

    /// Exposes the raw metadata counters `(entry_count, primary_page_count,
    /// overflow_page_count, deleted_overflow_page_count)` for callers
    /// checking the bookkeeping invariants directly (`spec.md` §8).
    pub fn raw_counters(&self) -> (u32, u32, u32, u32) {
        (
            self.metadata.entry_count,
            self.metadata.primary_page_count,
            self.metadata.overflow_page_count,
            self.metadata.deleted_overflow_page_count,
        )
    }

    pub fn hash(&self, key: &KeyValue) -> u64 {
        key.hash_code()
    }

    fn calc_bucket_with(key: &KeyValue, n: u32, p: u32) -> u32 {
        let h = key.hash_code();
        let mut b = (h % n as u64) as u32;
        if b < p {
            b = (h % (2 * n) as u64) as u32;
        }
        b
    }

    fn calc_bucket(&self, key: &KeyValue) -> u32 {
        Self::calc_bucket_with(key, self.metadata.n, self.metadata.p)
    }

    /// Appends empty primary pages until the primary file has as many pages
    /// as the metadata claims. Called lazily on the first operation after
    /// open, since a freshly opened primary file may still be empty.
    fn grow_to_fit(&mut self) -> Result<()> {
        if self.grown {
            return Ok(());
        }
        let target = self.metadata.primary_page_count;
        let current = self.primary.page_count()?;
        for page_num in current..target {
            let mut page = DataPage::new_empty(PageType::Primary, self.key_type, page_num);
            page.flush(&mut self.primary)?;
        }
        self.grown = true;
        Ok(())
    }

    fn load_chain(&mut self, bucket_no: u32) -> Result<Chain> {
        let mut pages = vec![DataPage::load(&mut self.primary, PageType::Primary, self.key_type, bucket_no)?];
        loop {
            let next = pages.last().expect("at least the primary page").next;
            if next == PAGE_END {
                break;
            }
            pages.push(DataPage::load(&mut self.overflow, PageType::Overflow, self.key_type, next)?);
        }
        Ok(Chain { bucket_no, pages })
    }

    fn flush_chain(&mut self, chain: &mut Chain) -> Result<()> {
        for page in &mut chain.pages {
            match page.page_type {
                PageType::Primary => page.flush(&mut self.primary)?,
                PageType::Overflow => page.flush(&mut self.overflow)?,
            }
        }
        Ok(())
    }

    fn new_overflow_page_num(&mut self) -> Result<u32> {
        let page_num = self.metadata.overflow_page_count + 1; // page 0 is metadata
        self.metadata.overflow_page_count += 1;
        self.metadata.mark_dirty();
        Ok(page_num)
    }

    /// Appends an entry to the last page of `chain`, adding a fresh overflow
    /// page first if it has no room.
    fn append_to_chain(&mut self, chain: &mut Chain, key: KeyValue, rid: Rid) -> Result<()> {
        if chain.page_with_space(&key).is_none() {
            let page_num = self.new_overflow_page_num()?;
            let mut new_page = DataPage::new_empty(PageType::Overflow, self.key_type, page_num);
            new_page.insert(key, rid)?;
            chain.pages.last_mut().expect("chain never empty").set_next(page_num);
            chain.pages.push(new_page);
        } else {
            chain.page_with_space(&key).expect("checked above").insert(key, rid)?;
        }
        Ok(())
    }

    /// Rebuilds the `from`/`to` bucket chains after a split: walks every
    /// entry currently in `from`'s chain and redistributes it according to
    /// the post-split metadata.
    fn rebalance_split(
        &mut self,
        from: u32,
        to: u32,
        old_chain: Chain,
    ) -> Result<(Chain, Chain)> {
        let original_overflow_pages: Vec<u32> = old_chain
            .pages
            .iter()
            .skip(1)
            .map(|p| p.page_num)
            .collect();

        let mut updated_old = Chain {
            bucket_no: from,
            pages: vec![DataPage::new_empty(PageType::Primary, self.key_type, from)],
        };
        let mut new_chain = Chain {
            bucket_no: to,
            pages: vec![DataPage::new_empty(PageType::Primary, self.key_type, to)],
        };

        let mut reuse_iter = original_overflow_pages.into_iter();
        let mut released = 0u32;

        for page in &old_chain.pages {
            for (key, rid) in page.entries() {
                let dest_bucket = Self::calc_bucket_with(key, self.metadata.n, self.metadata.p);
                let dest = if dest_bucket == from {
                    &mut updated_old
                } else if dest_bucket == to {
                    &mut new_chain
                } else {
                    return Err(StorageError::BadPage(format!(
                        "entry hashed to bucket {dest_bucket} during split of {from}->{to}"
                    )));
                };
                if dest.page_with_space(key).is_none() {
                    let page_num = if dest.bucket_no == from {
                        match reuse_iter.next() {
                            Some(n) => n,
                            None => self.new_overflow_page_num()?,
                        }
                    } else {
                        self.new_overflow_page_num()?
                    };
                    let mut fresh = DataPage::new_empty(PageType::Overflow, self.key_type, page_num);
                    fresh.insert(key.clone(), *rid)?;
                    dest.pages.last_mut().expect("chain never empty").set_next(page_num);
                    dest.pages.push(fresh);
                } else {
                    dest.page_with_space(key).expect("checked above").insert(key.clone(), *rid)?;
                }
            }
        }

        for leftover in reuse_iter {
            let _ = leftover;
            released += 1;
        }
        if released > 0 {
            self.metadata.deleted_overflow_page_count += released;
            self.metadata.mark_dirty();
        }

        Ok((updated_old, new_chain))
    }

    pub fn insert_entry(&mut self, key: KeyValue, rid: Rid) -> Result<()> {
        self.grow_to_fit()?;
        let b = self.calc_bucket(&key);
        let mut chain = self.load_chain(b)?;

        if chain.contains(&key, rid) {
            return Err(StorageError::DuplicateEntry);
        }

        if let Some(page) = chain.page_with_space(&key) {
            page.insert(key, rid)?;
            self.flush_chain(&mut chain)?;
            self.metadata.entry_count += 1;
            self.metadata.mark_dirty();
            self.metadata.flush(&mut self.overflow)?;
            return Ok(());
        }

        // Controlled split, independent of which bucket the new key hashes into.
        let from = self.metadata.p;
        let to = self.metadata.p + self.metadata.n;
        self.metadata.p += 1;
        if self.metadata.p == self.metadata.n {
            self.metadata.p = 0;
            self.metadata.n *= 2;
        }
        self.metadata.primary_page_count += 1;
        self.metadata.mark_dirty();

        debug!(index = %self.name, from, to, n = self.metadata.n, p = self.metadata.p, "controlled split");

        let (from_chain, mut untouched_target) = if b == from {
            (chain, None)
        } else {
            let from_chain = self.load_chain(from)?;
            (from_chain, Some(chain))
        };
        let (mut updated_old, mut new_chain) = self.rebalance_split(from, to, from_chain)?;

        let final_bucket = self.calc_bucket(&key);
        if let Some(mut target) = untouched_target.take() {
            self.append_to_chain(&mut target, key, rid)?;
            self.flush_chain(&mut updated_old)?;
            self.flush_chain(&mut new_chain)?;
            self.flush_chain(&mut target)?;
        } else if final_bucket == from {
            self.append_to_chain(&mut updated_old, key, rid)?;
            self.flush_chain(&mut updated_old)?;
            self.flush_chain(&mut new_chain)?;
        } else if final_bucket == to {
            self.append_to_chain(&mut new_chain, key, rid)?;
            self.flush_chain(&mut updated_old)?;
            self.flush_chain(&mut new_chain)?;
        } else {
            return Err(StorageError::BadPage(format!(
                "post-split bucket {final_bucket} is neither split source nor target"
            )));
        }

        self.metadata.entry_count += 1;
        self.metadata.mark_dirty();
        self.metadata.flush(&mut self.overflow)?;
        Ok(())
    }

    pub fn delete_entry(&mut self, key: KeyValue, rid: Rid) -> Result<()> {
        self.grow_to_fit()?;
        let b = self.calc_bucket(&key);
        let mut chain = self.load_chain(b)?;

        let removed_ix = chain
            .pages
            .iter_mut()
            .position(|p| p.remove(&key, rid).unwrap_or(false));
        let removed_ix = match removed_ix {
            Some(ix) => ix,
            None => return Err(StorageError::EntryNotFound),
        };

        if chain.pages[removed_ix].is_empty() {
            if removed_ix == 0 && chain.pages.len() > 1 {
                let mut successor = chain.pages.remove(1);
                let successor_next = successor.next;
                successor.discard();
                let entries = successor.take_entries();
                let primary = &mut chain.pages[0];
                for (k, r) in entries {
                    primary.insert(k, r)?;
                }
                primary.set_next(successor_next);
                self.metadata.deleted_overflow_page_count += 1;
                self.metadata.mark_dirty();
            } else if removed_ix > 0 {
                let mut spliced = chain.pages.remove(removed_ix);
                chain.pages[removed_ix - 1].set_next(spliced.next);
                spliced.discard();
                self.metadata.deleted_overflow_page_count += 1;
                self.metadata.mark_dirty();
            }
        }

        self.flush_chain(&mut chain)?;

        // Controlled shrink: walk trailing primary pages downward while they
        // stay at or above the initial bucket count.
        while self.metadata.primary_page_count > self.metadata.n_initial {
            let trailing = self.metadata.primary_page_count - 1;
            let trailing_chain = self.load_chain(trailing)?;
            if !trailing_chain.is_empty() {
                break;
            }
            self.metadata.primary_page_count -= 1;
            if self.metadata.p == 0 {
                self.metadata.n /= 2;
                self.metadata.p = self.metadata.n - 1;
            } else {
                self.metadata.p -= 1;
            }
            self.metadata.mark_dirty();
            debug!(index = %self.name, n = self.metadata.n, p = self.metadata.p, "controlled shrink");
        }

        self.metadata.entry_count -= 1;
        self.metadata.mark_dirty();
        self.metadata.flush(&mut self.overflow)?;
        Ok(())
    }

    pub fn scan(
        &mut self,
        low: Option<KeyValue>,
        high: Option<KeyValue>,
        low_inclusive: bool,
        high_inclusive: bool,
    ) -> Result<IndexScan<'_>> {
        self.grow_to_fit()?;
        let point = matches!((&low, &high), (Some(l), Some(h)) if low_inclusive == high_inclusive
            && l.compare(h).map(|o| o.is_eq()).unwrap_or(false));
        let start_bucket = if point {
            Self::calc_bucket_with(low.as_ref().expect("point scan has a low key"), self.metadata.n, self.metadata.p)
        } else {
            0
        };
        Ok(IndexScan::new(
            &mut self.primary,
            &mut self.overflow,
            self.key_type,
            low,
            high,
            low_inclusive,
            high_inclusive,
            start_bucket,
            self.metadata.primary_page_count,
        ))
    }
}
