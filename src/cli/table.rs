//! `recordctl table` subcommands: create/insert/scan/stats over record files.

use std::io::Write;

use serde::Serialize;

use crate::error::{Result, StorageError};
use crate::pf::PagedFileManager;
use crate::rbf::record::{AttrKind, Attribute, FieldValue};
use crate::rbf::{CompOp, RecordFileManager};

use super::wprintln;

/// One scanned row, serialized for `--json` output.
#[derive(Serialize)]
struct RecordJson {
    page: u32,
    slot: u16,
    bytes: usize,
}

/// Parses a schema string like `id:int,score:real,note:varchar:64`.
pub fn parse_schema(spec: &str) -> Result<Vec<Attribute>> {
    spec.split(',')
        .map(|col| {
            let mut parts = col.splitn(3, ':');
            let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| {
                StorageError::BadData(format!("empty column name in schema {spec:?}"))
            })?;
            let kind = parts.next().ok_or_else(|| {
                StorageError::BadData(format!("missing type for column {name:?}"))
            })?;
            match kind {
                "int" => Ok(Attribute::int(name)),
                "real" => Ok(Attribute::real(name)),
                "varchar" => {
                    let len: u32 = parts
                        .next()
                        .ok_or_else(|| {
                            StorageError::BadData(format!("varchar column {name:?} needs a length"))
                        })?
                        .parse()
                        .map_err(|_| StorageError::BadData(format!("bad length for column {name:?}")))?;
                    Ok(Attribute::varchar(name, len))
                }
                other => Err(StorageError::BadData(format!("unknown column type {other:?}"))),
            }
        })
        .collect()
}

/// Parses comma-separated values against `schema`, in order.
pub fn parse_values(schema: &[Attribute], spec: &str) -> Result<Vec<FieldValue>> {
    let raw: Vec<&str> = spec.split(',').collect();
    if raw.len() != schema.len() {
        return Err(StorageError::BadData(format!(
            "expected {} values for schema, got {}",
            schema.len(),
            raw.len()
        )));
    }
    schema
        .iter()
        .zip(raw)
        .map(|(attr, v)| match attr.kind {
            AttrKind::Int => v
                .parse::<i32>()
                .map(FieldValue::Int)
                .map_err(|_| StorageError::BadData(format!("bad int value {v:?}"))),
            AttrKind::Real => v
                .parse::<f32>()
                .map(FieldValue::Real)
                .map_err(|_| StorageError::BadData(format!("bad real value {v:?}"))),
            AttrKind::VarChar => Ok(FieldValue::VarChar(v.as_bytes().to_vec())),
        })
        .collect()
}

fn parse_filter(schema: &[Attribute], spec: &str) -> Result<(String, CompOp, FieldValue)> {
    let mut parts = spec.splitn(3, ':');
    let name = parts
        .next()
        .ok_or_else(|| StorageError::BadData("empty filter".into()))?;
    let op = match parts.next() {
        Some("eq") => CompOp::Eq,
        Some("lt") => CompOp::Lt,
        Some("gt") => CompOp::Gt,
        Some("le") => CompOp::Le,
        Some("ge") => CompOp::Ge,
        Some("ne") => CompOp::Ne,
        _ => return Err(StorageError::BadData(format!("bad filter operator in {spec:?}"))),
    };
    let attr = schema
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| StorageError::AttrNotFound(name.to_string()))?;
    let raw = parts
        .next()
        .ok_or_else(|| StorageError::BadData(format!("filter {spec:?} is missing a value")))?;
    let value = match attr.kind {
        AttrKind::Int => FieldValue::Int(
            raw.parse()
                .map_err(|_| StorageError::BadData(format!("bad int filter value {raw:?}")))?,
        ),
        AttrKind::Real => FieldValue::Real(
            raw.parse()
                .map_err(|_| StorageError::BadData(format!("bad real filter value {raw:?}")))?,
        ),
        AttrKind::VarChar => FieldValue::VarChar(raw.as_bytes().to_vec()),
    };
    Ok((name.to_string(), op, value))
}

pub struct CreateOptions {
    pub name: String,
    pub schema: String,
}

pub fn create(opts: &CreateOptions, writer: &mut dyn Write) -> Result<()> {
    let _ = parse_schema(&opts.schema)?; // validated up front; schema itself isn't persisted
    PagedFileManager::create(crate::util::fs::table_path(&opts.name))?;
    wprintln!(writer, "created table {}", opts.name)?;
    Ok(())
}

pub struct InsertOptions {
    pub name: String,
    pub schema: String,
    pub values: String,
}

pub fn insert(opts: &InsertOptions, writer: &mut dyn Write) -> Result<()> {
    let schema = parse_schema(&opts.schema)?;
    let fields = parse_values(&schema, &opts.values)?;
    let mut rfm = RecordFileManager::new();
    let mut handle = rfm.open(crate::util::fs::table_path(&opts.name))?;
    let rid = rfm.insert(&mut handle, &schema, &fields)?;
    rfm.close(handle)?;
    wprintln!(writer, "inserted at ({}, {})", rid.page, rid.slot)?;
    Ok(())
}

pub struct ScanOptions {
    pub name: String,
    pub schema: String,
    pub filter: Option<String>,
    pub project: Option<String>,
    pub json: bool,
}

pub fn scan(opts: &ScanOptions, writer: &mut dyn Write) -> Result<()> {
    let schema = parse_schema(&opts.schema)?;
    let condition = opts
        .filter
        .as_deref()
        .map(|f| parse_filter(&schema, f))
        .transpose()?;
    let project: Vec<String> = match &opts.project {
        Some(p) => p.split(',').map(str::to_string).collect(),
        None => schema.iter().map(|a| a.name.clone()).collect(),
    };
    let project_refs: Vec<&str> = project.iter().map(String::as_str).collect();

    let mut rfm = RecordFileManager::new();
    let mut handle = rfm.open(crate::util::fs::table_path(&opts.name))?;
    let cond = condition.as_ref().map(|(n, op, v)| (n.as_str(), *op, v.clone()));
    let results = rfm.scan(&mut handle, &schema, cond, &project_refs)?;
    let mut count = 0usize;
    for row in results {
        let (rid, bytes) = row?;
        count += 1;
        if opts.json {
            let row = RecordJson { page: rid.page, slot: rid.slot, bytes: bytes.len() };
            let json = serde_json::to_string(&row)
                .map_err(|e| StorageError::BadData(format!("failed to serialize row as JSON: {e}")))?;
            wprintln!(writer, "{json}")?;
        } else {
            wprintln!(writer, "({}, {}) -> {} bytes", rid.page, rid.slot, bytes.len())?;
        }
    }
    rfm.close(handle)?;
    if !opts.json {
        wprintln!(writer, "{count} record(s)")?;
    }
    Ok(())
}

pub struct StatsOptions {
    pub name: String,
}

pub fn stats(opts: &StatsOptions, writer: &mut dyn Write) -> Result<()> {
    let mut rfm = RecordFileManager::new();
    let mut handle = rfm.open(crate::util::fs::table_path(&opts.name))?;
    let page_count = handle.page_count()?;
    let (reads, writes, appends) = handle.counters();
    rfm.close(handle)?;
    wprintln!(writer, "pages: {page_count}")?;
    wprintln!(writer, "reads: {reads}, writes: {writes}, appends: {appends}")?;
    Ok(())
}
