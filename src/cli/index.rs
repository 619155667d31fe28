//! `recordctl index` subcommands: create/insert/delete/scan/stats over
//! linear-hashing index files.

use std::io::Write;

use serde::Serialize;

use crate::error::{Result, StorageError};
use crate::ix::{HashIndex, KeyValue};
use crate::rbf::{AttrKind, Rid};

use super::wprintln;

/// One scanned entry, serialized for `--json` output. `key` is the key's
/// `Debug` rendering (e.g. `Int(5)`, `VarChar([97, 97])`) rather than a
/// type-specific encoding, since the CLI surface doesn't need to round-trip
/// JSON back into a `KeyValue`.
#[derive(Serialize)]
struct EntryJson {
    key: String,
    page: u32,
    slot: u16,
}

fn parse_key(kind: AttrKind, raw: &str) -> Result<KeyValue> {
    match kind {
        AttrKind::Int => raw
            .parse()
            .map(KeyValue::Int)
            .map_err(|_| StorageError::BadData(format!("bad int key {raw:?}"))),
        AttrKind::Real => raw
            .parse()
            .map(KeyValue::Real)
            .map_err(|_| StorageError::BadData(format!("bad real key {raw:?}"))),
        AttrKind::VarChar => Ok(KeyValue::VarChar(raw.as_bytes().to_vec())),
    }
}

pub struct CreateOptions {
    pub name: String,
    pub initial_buckets: u32,
    pub key_type: AttrKind,
}

pub fn create(opts: &CreateOptions, writer: &mut dyn Write) -> Result<()> {
    HashIndex::create(&opts.name, opts.initial_buckets)?;
    wprintln!(writer, "created index {} ({} initial buckets)", opts.name, opts.initial_buckets)?;
    Ok(())
}

pub struct InsertOptions {
    pub name: String,
    pub key_type: AttrKind,
    pub key: String,
    pub rid_page: u32,
    pub rid_slot: u16,
}

pub fn insert(opts: &InsertOptions, writer: &mut dyn Write) -> Result<()> {
    let mut index = HashIndex::open(&opts.name, opts.key_type)?;
    let key = parse_key(opts.key_type, &opts.key)?;
    index.insert_entry(key, Rid::new(opts.rid_page, opts.rid_slot))?;
    index.close()?;
    wprintln!(writer, "inserted")?;
    Ok(())
}

pub struct DeleteOptions {
    pub name: String,
    pub key_type: AttrKind,
    pub key: String,
    pub rid_page: u32,
    pub rid_slot: u16,
}

pub fn delete(opts: &DeleteOptions, writer: &mut dyn Write) -> Result<()> {
    let mut index = HashIndex::open(&opts.name, opts.key_type)?;
    let key = parse_key(opts.key_type, &opts.key)?;
    index.delete_entry(key, Rid::new(opts.rid_page, opts.rid_slot))?;
    index.close()?;
    wprintln!(writer, "deleted")?;
    Ok(())
}

pub struct ScanOptions {
    pub name: String,
    pub key_type: AttrKind,
    pub low: Option<String>,
    pub high: Option<String>,
    pub low_exclusive: bool,
    pub high_exclusive: bool,
    pub json: bool,
}

pub fn scan(opts: &ScanOptions, writer: &mut dyn Write) -> Result<()> {
    let mut index = HashIndex::open(&opts.name, opts.key_type)?;
    let low = opts.low.as_deref().map(|s| parse_key(opts.key_type, s)).transpose()?;
    let high = opts.high.as_deref().map(|s| parse_key(opts.key_type, s)).transpose()?;
    let results = index.scan(low, high, !opts.low_exclusive, !opts.high_exclusive)?;
    let mut count = 0usize;
    for entry in results {
        let (key, rid) = entry?;
        count += 1;
        if opts.json {
            let row = EntryJson { key: format!("{key:?}"), page: rid.page, slot: rid.slot };
            let json = serde_json::to_string(&row)
                .map_err(|e| StorageError::BadData(format!("failed to serialize entry as JSON: {e}")))?;
            wprintln!(writer, "{json}")?;
        } else {
            wprintln!(writer, "{:?} -> ({}, {})", key, rid.page, rid.slot)?;
        }
    }
    index.close()?;
    if !opts.json {
        wprintln!(writer, "{count} entr{}", if count == 1 { "y" } else { "ies" })?;
    }
    Ok(())
}

pub struct StatsOptions {
    pub name: String,
    pub key_type: AttrKind,
}

pub fn stats(opts: &StatsOptions, writer: &mut dyn Write) -> Result<()> {
    let index = HashIndex::open(&opts.name, opts.key_type)?;
    wprintln!(writer, "primary pages: {}", index.num_primary_pages())?;
    wprintln!(writer, "all pages: {}", index.num_all_pages())?;
    index.close()?;
    Ok(())
}
