//! Record file manager: insert/read/update/delete/scan over variable-length
//! records laid out on slotted pages, with tombstone-based migration on
//! growth and a free-space directory for O(log n) insertion-site selection.

use crate::error::{Result, StorageError};
use crate::pf::{FileHandle, PagedFileManager, PAGE_SIZE};

use super::freespace::FreeSpaceDirectory;
use super::page::{self, SlotState};
use super::record::{self, Attribute, FieldValue};
use super::scan::{CompOp, RecordScan};
use super::Rid;

const FOOTER_BYTES: usize = 4;
const SLOT_BYTES: usize = 4;
/// Largest record that can ever fit on a freshly initialized page.
const MAX_RECORD_SIZE: usize = PAGE_SIZE - FOOTER_BYTES - SLOT_BYTES;

fn file_key(handle: &FileHandle) -> String {
    handle.path().to_string_lossy().into_owned()
}

/// Owns the free-space directory and scratch buffer shared across every
/// table file opened through it. Not a process-wide singleton — construct
/// one per session, or one per table, as the caller prefers.
pub struct RecordFileManager {
    fsd: FreeSpaceDirectory,
    scratch: Vec<u8>,
}

impl Default for RecordFileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFileManager {
    pub fn new() -> Self {
        RecordFileManager {
            fsd: FreeSpaceDirectory::new(),
            scratch: vec![0u8; PAGE_SIZE],
        }
    }

    pub fn create(&self, name: impl AsRef<std::path::Path>) -> Result<()> {
        PagedFileManager::create(name)
    }

    pub fn destroy(&self, name: impl AsRef<std::path::Path>) -> Result<()> {
        PagedFileManager::destroy(name)
    }

    pub fn open(&mut self, name: impl AsRef<std::path::Path>) -> Result<FileHandle> {
        let mut handle = PagedFileManager::open(name)?;
        self.fsd.buffer_on_open(&file_key(&handle), &mut handle)?;
        Ok(handle)
    }

    pub fn close(&mut self, handle: FileHandle) -> Result<()> {
        self.fsd.clear(&file_key(&handle));
        PagedFileManager::close(handle)
    }

    /// Inserts a record, returning its RID.
    pub fn insert(
        &mut self,
        handle: &mut FileHandle,
        schema: &[Attribute],
        fields: &[FieldValue],
    ) -> Result<Rid> {
        let bytes = record::encode_record(schema, fields)?;
        self.insert_bytes(handle, &bytes)
    }

    fn insert_bytes(&mut self, handle: &mut FileHandle, bytes: &[u8]) -> Result<Rid> {
        let size = bytes.len();
        if size > MAX_RECORD_SIZE {
            return Err(StorageError::SizeTooLarge { size, capacity: MAX_RECORD_SIZE });
        }
        let key = file_key(handle);
        let (page_no, is_new_page) = match self.fsd.allocate(&key, size as u16) {
            Some(p) => (p, false),
            None => (handle.page_count()?, true),
        };

        let mut buf = std::mem::take(&mut self.scratch);
        if is_new_page {
            page::init_clean_page(&mut buf);
        } else {
            handle.read_page(page_no, &mut buf)?;
        }

        let free_ptr = page::free_ptr(&buf);
        let slot_no = match page::first_deleted_slot(&buf) {
            Some(s) => s,
            None => page::slot_count(&buf),
        };
        page::write_record_bytes(&mut buf, free_ptr, bytes);
        page::set_occupied(&mut buf, slot_no, free_ptr, size as u16);
        page::set_free_ptr(&mut buf, free_ptr + size as u16);
        if slot_no == page::slot_count(&buf) {
            page::set_slot_count(&mut buf, slot_no + 1);
        }

        let new_free = page::free_space(&buf) as u16;
        if is_new_page {
            handle.append_page(&buf)?;
        } else {
            handle.write_page(page_no, &buf)?;
        }
        self.fsd.insert(&key, page_no, new_free);

        self.scratch = buf;
        Ok(Rid::new(page_no, slot_no))
    }

    /// Reads a record, transparently following forwarding pointers.
    pub fn read(&mut self, handle: &mut FileHandle, rid: Rid) -> Result<Vec<u8>> {
        let mut current = rid;
        let mut hops = 0;
        loop {
            let mut buf = std::mem::take(&mut self.scratch);
            handle.read_page(current.page, &mut buf)?;
            let state = page::slot_state(&buf, current.slot);
            let result = match state {
                SlotState::Occupied { start, length } => {
                    Ok(page::record_bytes(&buf, start, length).to_vec())
                }
                SlotState::Forwarding { rid: target } => {
                    hops += 1;
                    if hops > 1000 {
                        Err(StorageError::BadData("forwarding cycle detected".into()))
                    } else {
                        current = target;
                        self.scratch = buf;
                        continue;
                    }
                }
                SlotState::Deleted | SlotState::TombstoneEnd => Err(StorageError::RecordNotFound),
            };
            self.scratch = buf;
            return result;
        }
    }

    /// Updates a record in place, growing onto a new page via a forwarding
    /// pointer (`spec.md` §4.3 cases 1-3) when the current page has no room.
    pub fn update(
        &mut self,
        handle: &mut FileHandle,
        schema: &[Attribute],
        rid: Rid,
        fields: &[FieldValue],
    ) -> Result<()> {
        let new_bytes = record::encode_record(schema, fields)?;
        self.update_bytes(handle, rid, &new_bytes)
    }

    fn update_bytes(&mut self, handle: &mut FileHandle, rid: Rid, new_bytes: &[u8]) -> Result<()> {
        let mut buf = std::mem::take(&mut self.scratch);
        handle.read_page(rid.page, &mut buf)?;
        let state = page::slot_state(&buf, rid.slot);

        let (start, old_length) = match state {
            SlotState::Forwarding { rid: target } => {
                self.scratch = buf;
                return self.update_bytes(handle, target, new_bytes);
            }
            SlotState::Deleted | SlotState::TombstoneEnd => {
                self.scratch = buf;
                return Err(StorageError::RecordNotFound);
            }
            SlotState::Occupied { start, length } => (start, length),
        };

        let key = file_key(handle);
        let old_free = page::free_space(&buf) as u16;
        let new_len = new_bytes.len();

        if new_len <= old_length as usize {
            page::write_record_bytes(&mut buf, start, new_bytes);
            page::set_occupied(&mut buf, rid.slot, start, new_len as u16);
        } else if new_len <= page::free_space(&buf) {
            let free_ptr = page::free_ptr(&buf);
            page::write_record_bytes(&mut buf, free_ptr, new_bytes);
            page::set_occupied(&mut buf, rid.slot, free_ptr, new_len as u16);
            page::set_free_ptr(&mut buf, free_ptr + new_len as u16);
        } else {
            // Case 3: no room here — insert the new version elsewhere, then
            // turn this slot into a forwarding pointer to it.
            self.scratch = buf;
            let new_rid = self.insert_bytes(handle, new_bytes)?;
            let mut buf = std::mem::take(&mut self.scratch);
            handle.read_page(rid.page, &mut buf)?;
            page::set_forwarding(&mut buf, rid.slot, new_rid)?;
            let new_free = page::free_space(&buf) as u16;
            handle.write_page(rid.page, &buf)?;
            self.fsd.update(&key, rid.page, old_free, new_free);
            self.scratch = buf;
            return Ok(());
        }

        let new_free = page::free_space(&buf) as u16;
        handle.write_page(rid.page, &buf)?;
        self.fsd.update(&key, rid.page, old_free, new_free);
        self.scratch = buf;
        Ok(())
    }

    /// Deletes a record. If `rid` is a forwarding pointer the target is
    /// deleted first, then the forwarding slot itself is marked deleted.
    pub fn delete(&mut self, handle: &mut FileHandle, rid: Rid) -> Result<()> {
        let mut buf = std::mem::take(&mut self.scratch);
        handle.read_page(rid.page, &mut buf)?;
        let state = page::slot_state(&buf, rid.slot);
        self.scratch = buf;

        if let SlotState::Forwarding { rid: target } = state {
            self.delete(handle, target)?;
        } else if matches!(state, SlotState::Deleted | SlotState::TombstoneEnd) {
            return Err(StorageError::RecordNotFound);
        }

        let mut buf = std::mem::take(&mut self.scratch);
        handle.read_page(rid.page, &mut buf)?;
        let key = file_key(handle);
        let old_free = page::free_space(&buf) as u16;
        page::set_deleted(&mut buf, rid.slot);
        let new_free = page::free_space(&buf) as u16;
        handle.write_page(rid.page, &buf)?;
        self.fsd.update(&key, rid.page, old_free, new_free);
        self.scratch = buf;
        Ok(())
    }

    /// Resets every page in the file to empty, dropping all records.
    pub fn delete_all(&mut self, handle: &mut FileHandle) -> Result<()> {
        let key = file_key(handle);
        let page_count = handle.page_count()?;
        let mut buf = std::mem::take(&mut self.scratch);
        for page_no in 0..page_count {
            for b in buf.iter_mut() {
                *b = 0;
            }
            page::set_free_ptr(&mut buf, 0);
            page::set_slot_count(&mut buf, 0);
            handle.write_page(page_no, &buf)?;
            let free = page::free_space(&buf) as u16;
            self.fsd.insert(&key, page_no, free);
        }
        self.scratch = buf;
        Ok(())
    }

    /// Returns the raw bytes of one attribute of a record, following
    /// forwarding pointers first.
    pub fn read_attribute(
        &mut self,
        handle: &mut FileHandle,
        schema: &[Attribute],
        rid: Rid,
        name: &str,
    ) -> Result<Vec<u8>> {
        let bytes = self.read(handle, rid)?;
        record::read_attribute_bytes(schema, &bytes, name).map(|b| b.to_vec())
    }

    /// Packs all occupied records on a page to the front, preserving slot
    /// identities and directory order (no RID changes).
    pub fn reorganize_page(&mut self, handle: &mut FileHandle, page_no: u32) -> Result<()> {
        let key = file_key(handle);
        let mut buf = std::mem::take(&mut self.scratch);
        handle.read_page(page_no, &mut buf)?;
        let old_free = page::free_space(&buf) as u16;

        let slot_count = page::slot_count(&buf);
        let mut occupied: Vec<(u16, u16, u16)> = Vec::new(); // (slot, start, length)
        for slot in 0..slot_count {
            if let SlotState::Occupied { start, length } = page::slot_state(&buf, slot) {
                occupied.push((slot, start, length));
            }
        }
        occupied.sort_by_key(|&(_, start, _)| start);

        let mut packed = vec![0u8; PAGE_SIZE];
        let mut cursor = 0u16;
        for &(slot, start, length) in &occupied {
            let bytes = page::record_bytes(&buf, start, length).to_vec();
            page::write_record_bytes(&mut packed, cursor, &bytes);
            cursor += length;
            let _ = slot;
        }
        // Copy directory and footer verbatim; only occupied starts move.
        let dir_start = PAGE_SIZE - FOOTER_BYTES - SLOT_BYTES * slot_count as usize;
        packed[dir_start..].copy_from_slice(&buf[dir_start..]);
        for &(slot, _, length) in &occupied {
            let new_start = {
                let mut c = 0u16;
                for &(s2, _, l2) in &occupied {
                    if s2 == slot {
                        break;
                    }
                    c += l2;
                }
                c
            };
            page::set_occupied(&mut packed, slot, new_start, length);
        }
        page::set_free_ptr(&mut packed, cursor);

        let new_free = page::free_space(&packed) as u16;
        handle.write_page(page_no, &packed)?;
        self.fsd.update(&key, page_no, old_free, new_free);
        self.scratch = packed;
        Ok(())
    }

    /// Returns a lazy, forward-only, filtered/projected scan over every live
    /// record in the file.
    pub fn scan<'a>(
        &mut self,
        handle: &'a mut FileHandle,
        schema: &[Attribute],
        condition: Option<(&str, CompOp, FieldValue)>,
        project: &[&str],
    ) -> Result<RecordScan<'a>> {
        let cond = condition.map(|(name, op, value)| (name.to_string(), op, value));
        let project = project.iter().map(|s| s.to_string()).collect();
        RecordScan::new(handle, schema.to_vec(), cond, project)
    }
}
