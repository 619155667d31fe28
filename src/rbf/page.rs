//! In-page binary layout for data pages (the "slotted page" format).
//!
//! Records grow from byte 0 upward; the slot directory grows from the end
//! of the page downward. The trailing four bytes hold the free pointer and
//! slot count; each slot above that is a `(length, start)` pair of signed
//! 16-bit little-endian words (offsets counted from the end of the page, per
//! `spec.md` §4.2).
//!
//! A slot's `(start, length)` pair carries four distinct meanings (`spec.md`
//! §3 "Slot states"): occupied, deleted (reusable), forwarding pointer (both
//! fields negative, encoding `(-start, -length)` as the forwarded RID's
//! `(page, slot)`), and tombstone end-marker (both zero). Because both
//! fields are 16-bit, a forwarding pointer can only target page numbers and
//! slot numbers below 32768 — the same limit the slotted-page format itself
//! imposes on every other 16-bit field here.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};
use crate::pf::PAGE_SIZE;

use super::Rid;

const FOOTER_BYTES: usize = 4; // free pointer word + slot count word
const SLOT_BYTES: usize = 4; // length word + start word

fn free_ptr_offset() -> usize {
    PAGE_SIZE - 2
}

fn slot_count_offset() -> usize {
    PAGE_SIZE - 4
}

fn slot_offset(slot: u16) -> usize {
    PAGE_SIZE - FOOTER_BYTES - SLOT_BYTES * (slot as usize + 1)
}

pub fn free_ptr(page: &[u8]) -> u16 {
    LittleEndian::read_u16(&page[free_ptr_offset()..])
}

pub fn set_free_ptr(page: &mut [u8], value: u16) {
    LittleEndian::write_u16(&mut page[free_ptr_offset()..], value);
}

pub fn slot_count(page: &[u8]) -> u16 {
    LittleEndian::read_u16(&page[slot_count_offset()..])
}

pub fn set_slot_count(page: &mut [u8], value: u16) {
    LittleEndian::write_u16(&mut page[slot_count_offset()..], value);
}

fn raw_slot(page: &[u8], slot: u16) -> (i16, i16) {
    let off = slot_offset(slot);
    let length = LittleEndian::read_i16(&page[off..]);
    let start = LittleEndian::read_i16(&page[off + 2..]);
    (start, length)
}

fn set_raw_slot(page: &mut [u8], slot: u16, start: i16, length: i16) {
    let off = slot_offset(slot);
    LittleEndian::write_i16(&mut page[off..], length);
    LittleEndian::write_i16(&mut page[off + 2..], start);
}

/// Decoded meaning of a slot directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Occupied { start: u16, length: u16 },
    Deleted,
    Forwarding { rid: Rid },
    TombstoneEnd,
}

pub fn slot_state(page: &[u8], slot: u16) -> SlotState {
    let (start, length) = raw_slot(page, slot);
    if start == 0 && length == 0 {
        return SlotState::TombstoneEnd;
    }
    if start < 0 && length < 0 {
        return SlotState::Forwarding {
            rid: Rid::new((-start) as u32, (-length) as u16),
        };
    }
    if start as usize == PAGE_SIZE && length == 0 {
        return SlotState::Deleted;
    }
    SlotState::Occupied {
        start: start as u16,
        length: length as u16,
    }
}

pub fn set_occupied(page: &mut [u8], slot: u16, start: u16, length: u16) {
    set_raw_slot(page, slot, start as i16, length as i16);
}

pub fn set_deleted(page: &mut [u8], slot: u16) {
    set_raw_slot(page, slot, PAGE_SIZE as i16, 0);
}

/// Encodes a forwarding pointer. Fails if the target doesn't fit the
/// format's 16-bit fields (see module docs).
pub fn set_forwarding(page: &mut [u8], slot: u16, target: Rid) -> Result<()> {
    if target.page > i16::MAX as u32 || target.slot > i16::MAX as u16 {
        return Err(StorageError::BadData(format!(
            "forwarding target {:?} exceeds the slotted-page 16-bit address range",
            target
        )));
    }
    set_raw_slot(page, slot, -(target.page as i16), -(target.slot as i16));
    Ok(())
}

/// Initializes a freshly allocated page: free pointer at 0, one slot marked
/// deleted (reserving its directory word for the first real insert).
pub fn init_clean_page(page: &mut [u8]) {
    for b in page.iter_mut() {
        *b = 0;
    }
    set_free_ptr(page, 0);
    set_slot_count(page, 1);
    set_deleted(page, 0);
}

/// Number of slot-directory entries that must be accounted for when
/// computing free space: the existing count if any slot is reusable
/// (deleted), else one more than the existing count (room for the next
/// insert's new slot).
pub fn slots_present(page: &[u8]) -> u16 {
    let count = slot_count(page);
    for s in 0..count {
        if matches!(slot_state(page, s), SlotState::Deleted) {
            return count;
        }
    }
    count + 1
}

/// Free bytes on the page per `spec.md` §4.2's accounting formula.
pub fn free_space(page: &[u8]) -> usize {
    let used = free_ptr(page) as usize + SLOT_BYTES * slots_present(page) as usize + FOOTER_BYTES;
    PAGE_SIZE.saturating_sub(used)
}

/// First deleted (reusable) slot number, if any.
pub fn first_deleted_slot(page: &[u8]) -> Option<u16> {
    let count = slot_count(page);
    (0..count).find(|&s| matches!(slot_state(page, s), SlotState::Deleted))
}

pub fn record_bytes(page: &[u8], start: u16, length: u16) -> &[u8] {
    &page[start as usize..start as usize + length as usize]
}

pub fn write_record_bytes(page: &mut [u8], start: u16, data: &[u8]) {
    page[start as usize..start as usize + data.len()].copy_from_slice(data);
}
