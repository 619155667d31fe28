//! Typed, comparable index key with a stable binary encoding shared with the
//! record layer's attribute format (`rbf::record`).

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};
use crate::rbf::{AttrKind, FieldValue};

/// An index key: Int, Real, or VarChar, matching one of the three attribute
/// kinds a record schema can declare.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int(i32),
    Real(f32),
    VarChar(Vec<u8>),
}

impl KeyValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            KeyValue::Int(_) => AttrKind::Int,
            KeyValue::Real(_) => AttrKind::Real,
            KeyValue::VarChar(_) => AttrKind::VarChar,
        }
    }

    /// Encoded size on disk: 4 bytes for Int/Real, `4 + len` for VarChar.
    pub fn encoded_size(&self) -> usize {
        match self {
            KeyValue::Int(_) | KeyValue::Real(_) => 4,
            KeyValue::VarChar(bytes) => 4 + bytes.len(),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            KeyValue::Int(v) => {
                let mut buf = [0u8; 4];
                LittleEndian::write_i32(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
            KeyValue::Real(v) => {
                let mut buf = [0u8; 4];
                LittleEndian::write_f32(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
            KeyValue::VarChar(bytes) => {
                let mut len_buf = [0u8; 4];
                LittleEndian::write_u32(&mut len_buf, bytes.len() as u32);
                out.extend_from_slice(&len_buf);
                out.extend_from_slice(bytes);
            }
        }
    }

    /// Decodes a key of the given kind starting at `bytes[0..]`, returning
    /// the key and the number of bytes consumed.
    pub fn decode(kind: AttrKind, bytes: &[u8]) -> Result<(Self, usize)> {
        match kind {
            AttrKind::Int => {
                if bytes.len() < 4 {
                    return Err(StorageError::BadData("truncated int key".into()));
                }
                Ok((KeyValue::Int(LittleEndian::read_i32(bytes)), 4))
            }
            AttrKind::Real => {
                if bytes.len() < 4 {
                    return Err(StorageError::BadData("truncated real key".into()));
                }
                Ok((KeyValue::Real(LittleEndian::read_f32(bytes)), 4))
            }
            AttrKind::VarChar => {
                if bytes.len() < 4 {
                    return Err(StorageError::BadData("truncated varchar key length".into()));
                }
                let len = LittleEndian::read_u32(bytes) as usize;
                if bytes.len() < 4 + len {
                    return Err(StorageError::BadData("truncated varchar key body".into()));
                }
                Ok((KeyValue::VarChar(bytes[4..4 + len].to_vec()), 4 + len))
            }
        }
    }

    pub fn from_field(value: FieldValue) -> Self {
        match value {
            FieldValue::Int(v) => KeyValue::Int(v),
            FieldValue::Real(v) => KeyValue::Real(v),
            FieldValue::VarChar(v) => KeyValue::VarChar(v),
        }
    }

    /// Compares two keys of the same kind. Reals compare by total order on
    /// the wire value; NaN keys are rejected at encode time by callers that
    /// care, same as the record layer's scan predicate.
    pub fn compare(&self, other: &KeyValue) -> Result<Ordering> {
        match (self, other) {
            (KeyValue::Int(a), KeyValue::Int(b)) => Ok(a.cmp(b)),
            (KeyValue::Real(a), KeyValue::Real(b)) => a
                .partial_cmp(b)
                .ok_or_else(|| StorageError::BadData("NaN key value is not orderable".into())),
            (KeyValue::VarChar(a), KeyValue::VarChar(b)) => Ok(a.cmp(b)),
            _ => Err(StorageError::BadData("key type mismatch in comparison".into())),
        }
    }

    /// Hash code used for bucket addressing. Keys of equal value always hash
    /// identically, independent of process or platform.
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            KeyValue::Int(v) => v.hash(&mut hasher),
            KeyValue::Real(v) => v.to_bits().hash(&mut hasher),
            KeyValue::VarChar(v) => v.hash(&mut hasher),
        }
        hasher.finish()
    }
}
