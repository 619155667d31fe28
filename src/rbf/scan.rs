//! Filtered/projected scan over a record file.
//!
//! The iterator walks pages in order and, within each page, slots in
//! directory order. Forwarding slots are skipped (never followed) and
//! deleted slots are skipped; a live record is therefore emitted exactly
//! once, keyed by whichever RID its payload currently occupies — which may
//! be a forwarding target the scan reaches later on its own, not the RID the
//! caller originally inserted under (`spec.md` §4.3).

use std::cmp::Ordering;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};
use crate::pf::FileHandle;

use super::page::{self, SlotState};
use super::record::{self, Attribute, AttrKind, FieldValue};
use super::Rid;

/// Comparison operator for a scan predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
    /// No condition — every record matches.
    NoOp,
}

fn ordering_matches(op: CompOp, ord: Ordering) -> bool {
    match op {
        CompOp::Eq => ord == Ordering::Equal,
        CompOp::Lt => ord == Ordering::Less,
        CompOp::Gt => ord == Ordering::Greater,
        CompOp::Le => ord != Ordering::Greater,
        CompOp::Ge => ord != Ordering::Less,
        CompOp::Ne => ord != Ordering::Equal,
        CompOp::NoOp => true,
    }
}

fn meets_criterion(
    schema: &[Attribute],
    bytes: &[u8],
    cond: &Option<(String, CompOp, FieldValue)>,
) -> Result<bool> {
    let Some((attr_name, op, value)) = cond else {
        return Ok(true);
    };
    if *op == CompOp::NoOp {
        return Ok(true);
    }
    let attr = schema
        .iter()
        .find(|a| &a.name == attr_name)
        .ok_or_else(|| StorageError::AttrNotFound(attr_name.clone()))?;
    let field_bytes = record::read_attribute_bytes(schema, bytes, attr_name)?;
    let matched = match (attr.kind, value) {
        (AttrKind::Int, FieldValue::Int(v)) => {
            let actual = LittleEndian::read_i32(field_bytes);
            ordering_matches(*op, actual.cmp(v))
        }
        (AttrKind::Real, FieldValue::Real(v)) => {
            let actual = LittleEndian::read_f32(field_bytes);
            match actual.partial_cmp(v) {
                Some(ord) => ordering_matches(*op, ord),
                None => *op == CompOp::Ne,
            }
        }
        (AttrKind::VarChar, FieldValue::VarChar(v)) => {
            // field_bytes includes the 4-byte length prefix; compare raw chars only.
            let actual = &field_bytes[4..];
            ordering_matches(*op, actual.cmp(v.as_slice()))
        }
        _ => false,
    };
    Ok(matched)
}

/// Lazy, forward-only scan over a record file's live records.
pub struct RecordScan<'a> {
    handle: &'a mut FileHandle,
    schema: Vec<Attribute>,
    cond: Option<(String, CompOp, FieldValue)>,
    project: Vec<String>,
    page_no: u32,
    page_count: u32,
    slot_no: u16,
    slot_count: u16,
    buf: Vec<u8>,
    page_loaded: bool,
}

impl<'a> RecordScan<'a> {
    pub(super) fn new(
        handle: &'a mut FileHandle,
        schema: Vec<Attribute>,
        cond: Option<(String, CompOp, FieldValue)>,
        project: Vec<String>,
    ) -> Result<Self> {
        let page_count = handle.page_count()?;
        Ok(RecordScan {
            handle,
            schema,
            cond,
            project,
            page_no: 0,
            page_count,
            slot_no: 0,
            slot_count: 0,
            buf: vec![0u8; crate::pf::PAGE_SIZE],
            page_loaded: false,
        })
    }

    fn load_page(&mut self) -> Result<bool> {
        while self.page_no < self.page_count {
            self.handle.read_page(self.page_no, &mut self.buf)?;
            self.slot_count = page::slot_count(&self.buf);
            self.slot_no = 0;
            self.page_loaded = true;
            return Ok(true);
        }
        Ok(false)
    }

    fn project_bytes(&self, record_bytes: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for name in &self.project {
            out.extend_from_slice(record::read_attribute_bytes(&self.schema, record_bytes, name)?);
        }
        Ok(out)
    }

    fn advance(&mut self) -> Result<Option<(Rid, Vec<u8>)>> {
        loop {
            if !self.page_loaded {
                if !self.load_page()? {
                    return Ok(None);
                }
            }
            while self.slot_no < self.slot_count {
                let slot = self.slot_no;
                self.slot_no += 1;
                if let SlotState::Occupied { start, length } = page::slot_state(&self.buf, slot) {
                    let bytes = page::record_bytes(&self.buf, start, length).to_vec();
                    if meets_criterion(&self.schema, &bytes, &self.cond)? {
                        let projected = self.project_bytes(&bytes)?;
                        return Ok(Some((Rid::new(self.page_no, slot), projected)));
                    }
                }
            }
            self.page_loaded = false;
            self.page_no += 1;
        }
    }
}

impl<'a> Iterator for RecordScan<'a> {
    type Item = Result<(Rid, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
