//! Criterion benchmarks for reldb-core's storage layers.
//!
//! Benchmarks cover:
//! - Record insertion throughput (rbf::RecordFileManager::insert)
//! - Full-table scan throughput (rbf::RecordFileManager::scan)
//! - Linear-hash insertion throughput, including controlled splits (ix::HashIndex)
//! - Point-scan lookup throughput on a populated index

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use reldb_core::ix::{HashIndex, KeyValue};
use reldb_core::rbf::{AttrKind, Attribute, FieldValue, RecordFileManager};
use reldb_core::rbf::Rid;

fn schema() -> Vec<Attribute> {
    vec![Attribute::int("id"), Attribute::real("balance")]
}

fn bench_record_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_insert");
    for &n in &[100u32, 1_000, 5_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let path = dir.path().join("bench.tbl");
                let mut rfm = RecordFileManager::new();
                rfm.create(&path).unwrap();
                let mut handle = rfm.open(&path).unwrap();
                let schema = schema();
                for i in 0..n {
                    rfm.insert(
                        &mut handle,
                        &schema,
                        &[FieldValue::Int(i as i32), FieldValue::Real(i as f32)],
                    )
                    .unwrap();
                }
                rfm.close(handle).unwrap();
                black_box(());
            })
        });
    }
    group.finish();
}

fn bench_record_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_scan");
    for &n in &[1_000u32, 5_000] {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.tbl");
        let mut rfm = RecordFileManager::new();
        rfm.create(&path).unwrap();
        let mut handle = rfm.open(&path).unwrap();
        let schema = schema();
        for i in 0..n {
            rfm.insert(&mut handle, &schema, &[FieldValue::Int(i as i32), FieldValue::Real(i as f32)])
                .unwrap();
        }

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let scan = rfm.scan(&mut handle, &schema, None, &["id", "balance"]).unwrap();
                let count = scan.filter_map(Result::ok).count();
                black_box(count);
            })
        });
        rfm.close(handle).unwrap();
    }
    group.finish();
}

fn bench_index_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_insert");
    for &n in &[1_000u32, 5_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let name = dir.path().join("bench").to_string_lossy().into_owned();
                HashIndex::create(&name, 4).unwrap();
                let mut index = HashIndex::open(&name, AttrKind::Int).unwrap();
                for i in 0..n {
                    index
                        .insert_entry(KeyValue::Int(i as i32), Rid::new(i + 1, 1))
                        .unwrap();
                }
                index.close().unwrap();
                black_box(());
            })
        });
    }
    group.finish();
}

fn bench_index_point_scan(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("bench").to_string_lossy().into_owned();
    HashIndex::create(&name, 4).unwrap();
    let mut index = HashIndex::open(&name, AttrKind::Int).unwrap();
    for i in 0..5_000u32 {
        index.insert_entry(KeyValue::Int(i as i32), Rid::new(i + 1, 1)).unwrap();
    }

    let mut group = c.benchmark_group("index_point_scan");
    group.bench_function("lookup", |b| {
        b.iter(|| {
            let scan = index
                .scan(Some(KeyValue::Int(2_500)), Some(KeyValue::Int(2_500)), true, true)
                .unwrap();
            let count = scan.filter_map(Result::ok).count();
            black_box(count);
        })
    });
    group.finish();
    index.close().unwrap();
}

criterion_group!(
    benches,
    bench_record_insert,
    bench_record_scan,
    bench_index_insert,
    bench_index_point_scan
);
criterion_main!(benches);
