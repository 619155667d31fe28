//! Record encoding: a record is the concatenation of its attribute values in
//! schema order (`spec.md` §3/§6). Integers and reals are 4 little-endian
//! bytes; varchars are a 4-byte little-endian length prefix followed by that
//! many raw bytes.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};

/// Attribute type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Int,
    Real,
    VarChar,
}

/// One column of a record's schema.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub kind: AttrKind,
    /// Declared maximum length; only meaningful for `VarChar`.
    pub length: u32,
}

impl Attribute {
    pub fn int(name: impl Into<String>) -> Self {
        Attribute { name: name.into(), kind: AttrKind::Int, length: 4 }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Attribute { name: name.into(), kind: AttrKind::Real, length: 4 }
    }

    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Attribute { name: name.into(), kind: AttrKind::VarChar, length }
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Real(f32),
    VarChar(Vec<u8>),
}

/// Encodes field values into the on-disk record format, in schema order.
pub fn encode_record(schema: &[Attribute], fields: &[FieldValue]) -> Result<Vec<u8>> {
    if schema.len() != fields.len() {
        return Err(StorageError::BadData(format!(
            "schema has {} attributes but {} values were given",
            schema.len(),
            fields.len()
        )));
    }
    let mut out = Vec::new();
    for (attr, value) in schema.iter().zip(fields) {
        match (attr.kind, value) {
            (AttrKind::Int, FieldValue::Int(v)) => {
                let mut buf = [0u8; 4];
                LittleEndian::write_i32(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
            (AttrKind::Real, FieldValue::Real(v)) => {
                let mut buf = [0u8; 4];
                LittleEndian::write_f32(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
            (AttrKind::VarChar, FieldValue::VarChar(bytes)) => {
                let mut len_buf = [0u8; 4];
                LittleEndian::write_u32(&mut len_buf, bytes.len() as u32);
                out.extend_from_slice(&len_buf);
                out.extend_from_slice(bytes);
            }
            _ => {
                return Err(StorageError::BadData(format!(
                    "value for attribute {:?} does not match its declared type",
                    attr.name
                )))
            }
        }
    }
    Ok(out)
}

/// Walks `bytes` according to `schema`, returning each attribute's `(offset,
/// encoded_len)` span (the varchar span includes its length prefix).
fn attribute_spans(schema: &[Attribute], bytes: &[u8]) -> Result<Vec<(usize, usize)>> {
    let mut spans = Vec::with_capacity(schema.len());
    let mut pos = 0usize;
    for attr in schema {
        let span_len = match attr.kind {
            AttrKind::Int | AttrKind::Real => 4,
            AttrKind::VarChar => {
                if pos + 4 > bytes.len() {
                    return Err(StorageError::BadData("truncated varchar length prefix".into()));
                }
                let n = LittleEndian::read_u32(&bytes[pos..]) as usize;
                4 + n
            }
        };
        if pos + span_len > bytes.len() {
            return Err(StorageError::BadData(format!(
                "record truncated at attribute {:?}",
                attr.name
            )));
        }
        spans.push((pos, span_len));
        pos += span_len;
    }
    Ok(spans)
}

/// Total encoded size of a record, computed by walking the schema (the
/// course-project `countRecordSize`).
pub fn record_size(schema: &[Attribute], bytes: &[u8]) -> Result<usize> {
    let spans = attribute_spans(schema, bytes)?;
    Ok(spans.last().map(|(off, len)| off + len).unwrap_or(0))
}

/// Decodes every attribute in `bytes` per `schema`.
pub fn decode_record(schema: &[Attribute], bytes: &[u8]) -> Result<Vec<FieldValue>> {
    let spans = attribute_spans(schema, bytes)?;
    let mut values = Vec::with_capacity(schema.len());
    for (attr, (off, len)) in schema.iter().zip(spans) {
        let value = match attr.kind {
            AttrKind::Int => FieldValue::Int(LittleEndian::read_i32(&bytes[off..off + len])),
            AttrKind::Real => FieldValue::Real(LittleEndian::read_f32(&bytes[off..off + len])),
            AttrKind::VarChar => FieldValue::VarChar(bytes[off + 4..off + len].to_vec()),
        };
        values.push(value);
    }
    Ok(values)
}

/// Returns the raw bytes of `name` within an encoded record (for varchar,
/// including its 4-byte length prefix, per `spec.md` §4.3 `ReadAttribute`).
pub fn read_attribute_bytes<'a>(
    schema: &[Attribute],
    bytes: &'a [u8],
    name: &str,
) -> Result<&'a [u8]> {
    let spans = attribute_spans(schema, bytes)?;
    for (attr, (off, len)) in schema.iter().zip(spans) {
        if attr.name == name {
            return Ok(&bytes[off..off + len]);
        }
    }
    Err(StorageError::AttrNotFound(name.to_string()))
}
