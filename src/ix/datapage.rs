//! In-memory representation of one page of a bucket chain (primary or
//! overflow). Entries are buffered as `(key, rid)` pairs; `flush` serializes
//! them back to the page's byte layout, `discard` drops them unwritten.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};
use crate::pf::{FileHandle, PAGE_SIZE};
use crate::rbf::{AttrKind, Rid};

use super::keyvalue::KeyValue;

const WORD: usize = 4;
const FOOTER_WORDS: usize = 6;
const FOOTER_BYTES: usize = WORD * FOOTER_WORDS;
/// An entry's RID is stored as two 32-bit words (page, slot), matching the
/// original course project's `RID{unsigned pageNum, unsigned slotNum}`.
const RID_BYTES: usize = 8;

pub const PAGE_END: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Primary,
    Overflow,
}

impl PageType {
    fn to_word(self) -> u32 {
        match self {
            PageType::Primary => 0,
            PageType::Overflow => 1,
        }
    }

    fn from_word(w: u32) -> Result<Self> {
        match w {
            0 => Ok(PageType::Primary),
            1 => Ok(PageType::Overflow),
            other => Err(StorageError::BadData(format!("unknown page type word {other}"))),
        }
    }
}

fn attr_kind_to_word(kind: AttrKind) -> u32 {
    match kind {
        AttrKind::Int => 0,
        AttrKind::Real => 1,
        AttrKind::VarChar => 2,
    }
}

fn attr_kind_from_word(w: u32) -> Result<AttrKind> {
    match w {
        0 => Ok(AttrKind::Int),
        1 => Ok(AttrKind::Real),
        2 => Ok(AttrKind::VarChar),
        other => Err(StorageError::BadData(format!("unknown key type word {other}"))),
    }
}

/// The size an entry occupies in the packed data area.
pub fn entry_size(key: &KeyValue) -> usize {
    key.encoded_size() + RID_BYTES
}

/// One page of a bucket chain, buffered in memory.
#[derive(Debug, Clone)]
pub struct DataPage {
    pub page_type: PageType,
    pub key_type: AttrKind,
    pub page_num: u32,
    pub next: u32,
    entries: Vec<(KeyValue, Rid)>,
    dirty: bool,
}

impl DataPage {
    /// Builds a fresh, empty page (not yet written to disk).
    pub fn new_empty(page_type: PageType, key_type: AttrKind, page_num: u32) -> Self {
        DataPage {
            page_type,
            key_type,
            page_num,
            next: PAGE_END,
            entries: Vec::new(),
            dirty: true,
        }
    }

    pub fn load(handle: &mut FileHandle, page_type: PageType, key_type: AttrKind, page_num: u32) -> Result<Self> {
        let mut buf = vec![0u8; PAGE_SIZE];
        handle.read_page(page_num, &mut buf)?;
        Self::from_bytes(&buf, page_type, key_type, page_num)
    }

    fn from_bytes(buf: &[u8], expect_type: PageType, key_type: AttrKind, page_num: u32) -> Result<Self> {
        let page_type_off = PAGE_SIZE - WORD;
        let key_type_off = PAGE_SIZE - WORD * 2;
        let page_num_off = PAGE_SIZE - WORD * 3;
        let entries_count_off = PAGE_SIZE - WORD * 4;
        let entries_size_off = PAGE_SIZE - WORD * 5;
        let next_off = PAGE_SIZE - WORD * 6;

        let page_type = PageType::from_word(LittleEndian::read_u32(&buf[page_type_off..]))?;
        let wire_key_type = attr_kind_from_word(LittleEndian::read_u32(&buf[key_type_off..]))?;
        let wire_page_num = LittleEndian::read_u32(&buf[page_num_off..]);
        let entries_count = LittleEndian::read_u32(&buf[entries_count_off..]);
        let entries_size = LittleEndian::read_u32(&buf[entries_size_off..]) as usize;
        let next = LittleEndian::read_u32(&buf[next_off..]);

        if page_type != expect_type {
            return Err(StorageError::BadPage(format!(
                "page {page_num} has type {page_type:?}, expected {expect_type:?}"
            )));
        }
        if wire_page_num != page_num {
            return Err(StorageError::BadPage(format!(
                "page {page_num} reports page_num {wire_page_num}"
            )));
        }

        let mut entries = Vec::with_capacity(entries_count as usize);
        let mut pos = 0usize;
        for _ in 0..entries_count {
            if pos >= entries_size {
                return Err(StorageError::BadPage(format!(
                    "page {page_num} entries_size shorter than entries_count declares"
                )));
            }
            let (key, consumed) = KeyValue::decode(key_type, &buf[pos..entries_size])?;
            pos += consumed;
            if pos + RID_BYTES > entries_size {
                return Err(StorageError::BadPage(format!("page {page_num} truncated RID")));
            }
            let rid_page = LittleEndian::read_u32(&buf[pos..]);
            let rid_slot = LittleEndian::read_u32(&buf[pos + 4..]);
            pos += RID_BYTES;
            entries.push((key, Rid::new(rid_page, rid_slot as u16)));
        }

        Ok(DataPage {
            page_type,
            key_type: wire_key_type,
            page_num,
            next,
            entries,
            dirty: false,
        })
    }

    pub fn entries(&self) -> &[(KeyValue, Rid)] {
        &self.entries
    }

    pub fn entries_count(&self) -> usize {
        self.entries.len()
    }

    pub fn key_at(&self, index: usize) -> Option<&KeyValue> {
        self.entries.get(index).map(|(k, _)| k)
    }

    pub fn rid_at(&self, index: usize) -> Option<Rid> {
        self.entries.get(index).map(|(_, r)| *r)
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, _)| entry_size(k)).sum()
    }

    /// Bytes available for entry data, reserving the six-word footer.
    fn capacity(&self) -> usize {
        PAGE_SIZE - FOOTER_BYTES
    }

    pub fn has_space(&self, key: &KeyValue) -> bool {
        self.used_bytes() + entry_size(key) <= self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: KeyValue, rid: Rid) -> Result<()> {
        if !self.has_space(&key) {
            return Err(StorageError::NoSpace);
        }
        self.entries.push((key, rid));
        self.dirty = true;
        Ok(())
    }

    /// Removes the first entry matching `(key, rid)`. Returns whether one was found.
    pub fn remove(&mut self, key: &KeyValue, rid: Rid) -> Result<bool> {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|(k, r)| *r == rid && k.compare(key).map(|o| o.is_eq()).unwrap_or(false))
        {
            self.entries.remove(pos);
            self.dirty = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn contains(&self, key: &KeyValue, rid: Rid) -> bool {
        self.entries
            .iter()
            .any(|(k, r)| *r == rid && k.compare(key).map(|o| o.is_eq()).unwrap_or(false))
    }

    pub fn set_next(&mut self, next: u32) {
        if self.next != next {
            self.next = next;
            self.dirty = true;
        }
    }

    pub fn take_entries(self) -> Vec<(KeyValue, Rid)> {
        self.entries
    }

    pub fn from_entries(
        page_type: PageType,
        key_type: AttrKind,
        page_num: u32,
        next: u32,
        entries: Vec<(KeyValue, Rid)>,
    ) -> Self {
        DataPage { page_type, key_type, page_num, next, entries, dirty: true }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut pos = 0usize;
        for (key, rid) in &self.entries {
            let mut tmp = Vec::new();
            key.encode(&mut tmp);
            buf[pos..pos + tmp.len()].copy_from_slice(&tmp);
            pos += tmp.len();
            LittleEndian::write_u32(&mut buf[pos..], rid.page);
            LittleEndian::write_u32(&mut buf[pos + 4..], rid.slot as u32);
            pos += RID_BYTES;
        }
        let entries_size = pos as u32;

        let page_type_off = PAGE_SIZE - WORD;
        let key_type_off = PAGE_SIZE - WORD * 2;
        let page_num_off = PAGE_SIZE - WORD * 3;
        let entries_count_off = PAGE_SIZE - WORD * 4;
        let entries_size_off = PAGE_SIZE - WORD * 5;
        let next_off = PAGE_SIZE - WORD * 6;

        LittleEndian::write_u32(&mut buf[page_type_off..], self.page_type.to_word());
        LittleEndian::write_u32(&mut buf[key_type_off..], attr_kind_to_word(self.key_type));
        LittleEndian::write_u32(&mut buf[page_num_off..], self.page_num);
        LittleEndian::write_u32(&mut buf[entries_count_off..], self.entries.len() as u32);
        LittleEndian::write_u32(&mut buf[entries_size_off..], entries_size);
        LittleEndian::write_u32(&mut buf[next_off..], self.next);

        buf
    }

    /// Writes the page, appending if it doesn't yet exist. No-op if clean.
    pub fn flush(&mut self, handle: &mut FileHandle) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let buf = self.to_bytes();
        if handle.page_count()? <= self.page_num {
            handle.append_page(&buf)?;
        } else {
            handle.write_page(self.page_num, &buf)?;
        }
        self.dirty = false;
        Ok(())
    }

    pub fn discard(&mut self) {
        self.dirty = false;
    }
}

impl Drop for DataPage {
    fn drop(&mut self) {
        debug_assert!(!self.dirty, "DataPage {} dropped dirty without flush or discard", self.page_num);
    }
}
