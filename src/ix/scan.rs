//! Point and range scans over a linear-hashing index.
//!
//! The iterator holds at most one in-memory `DataPage` at a time and an
//! explicit `(bucket_no, entry_ix)` cursor — it never buffers a whole bucket
//! chain, so stepping through a large index costs O(1) memory regardless of
//! chain length.

use crate::error::Result;
use crate::pf::FileHandle;
use crate::rbf::{AttrKind, Rid};

use super::datapage::{DataPage, PageType, PAGE_END};
use super::keyvalue::KeyValue;

fn in_bounds(
    key: &KeyValue,
    low: &Option<KeyValue>,
    high: &Option<KeyValue>,
    low_inclusive: bool,
    high_inclusive: bool,
) -> Result<bool> {
    if let Some(low) = low {
        let ord = key.compare(low)?;
        let ok = if low_inclusive { ord.is_ge() } else { ord.is_gt() };
        if !ok {
            return Ok(false);
        }
    }
    if let Some(high) = high {
        let ord = key.compare(high)?;
        let ok = if high_inclusive { ord.is_le() } else { ord.is_lt() };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Lazy, forward-only, single-pass scan over an index's entries.
pub struct IndexScan<'a> {
    primary: &'a mut FileHandle,
    overflow: &'a mut FileHandle,
    key_type: AttrKind,
    low: Option<KeyValue>,
    high: Option<KeyValue>,
    low_inclusive: bool,
    high_inclusive: bool,
    point: bool,
    bucket_no: u32,
    total_primary: u32,
    current_page: Option<DataPage>,
    entry_ix: usize,
    done: bool,
}

impl<'a> IndexScan<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        primary: &'a mut FileHandle,
        overflow: &'a mut FileHandle,
        key_type: AttrKind,
        low: Option<KeyValue>,
        high: Option<KeyValue>,
        low_inclusive: bool,
        high_inclusive: bool,
        start_bucket: u32,
        total_primary: u32,
    ) -> Self {
        let point = matches!((&low, &high), (Some(l), Some(h)) if low_inclusive == high_inclusive
            && l.compare(h).map(|o| o.is_eq()).unwrap_or(false));
        IndexScan {
            primary,
            overflow,
            key_type,
            low,
            high,
            low_inclusive,
            high_inclusive,
            point,
            bucket_no: start_bucket,
            total_primary,
            current_page: None,
            entry_ix: 0,
            done: false,
        }
    }

    fn load_primary(&mut self) -> Result<()> {
        let page = DataPage::load(self.primary, PageType::Primary, self.key_type, self.bucket_no)?;
        self.current_page = Some(page);
        self.entry_ix = 0;
        Ok(())
    }

    fn load_overflow(&mut self, page_num: u32) -> Result<()> {
        let page = DataPage::load(self.overflow, PageType::Overflow, self.key_type, page_num)?;
        self.current_page = Some(page);
        self.entry_ix = 0;
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<(KeyValue, Rid)>> {
        if self.done {
            return Ok(None);
        }
        loop {
            if self.bucket_no >= self.total_primary {
                self.done = true;
                return Ok(None);
            }
            if self.current_page.is_none() {
                self.load_primary()?;
            }
            let page = self.current_page.as_ref().expect("just loaded");
            if self.entry_ix < page.entries_count() {
                let key = page.key_at(self.entry_ix).expect("index in range").clone();
                let rid = page.rid_at(self.entry_ix).expect("index in range");
                self.entry_ix += 1;
                if in_bounds(&key, &self.low, &self.high, self.low_inclusive, self.high_inclusive)? {
                    return Ok(Some((key, rid)));
                }
                continue;
            }
            let next = page.next;
            if next != PAGE_END {
                self.load_overflow(next)?;
                continue;
            }
            // Chain exhausted.
            if self.point {
                self.done = true;
                return Ok(None);
            }
            self.bucket_no += 1;
            self.current_page = None;
        }
    }
}

impl<'a> Iterator for IndexScan<'a> {
    type Item = Result<(KeyValue, Rid)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
