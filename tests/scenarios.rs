//! Integration tests for the concrete scenarios and testable properties:
//! record round-tripping, forwarding-pointer migration, and linear-hash
//! insert/scan/delete/shrink behavior across many keys.

use byteorder::{ByteOrder, LittleEndian};
use tempfile::TempDir;

use reldb_core::ix::{HashIndex, KeyValue};
use reldb_core::rbf::{AttrKind, Attribute, CompOp, FieldValue, RecordFileManager, Rid};
use reldb_core::StorageError;

fn person_schema() -> Vec<Attribute> {
    vec![
        Attribute::varchar("name", 30),
        Attribute::int("age"),
        Attribute::real("height"),
        Attribute::int("salary"),
    ]
}

#[test]
fn insert_read_integer_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    let schema = person_schema();
    let fields = [
        FieldValue::VarChar(b"Peters".to_vec()),
        FieldValue::Int(24),
        FieldValue::Real(170.1),
        FieldValue::Int(5000),
    ];
    let rid = rfm.insert(&mut handle, &schema, &fields).unwrap();
    let bytes = rfm.read(&mut handle, rid).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&6u32.to_le_bytes());
    expected.extend_from_slice(b"Peters");
    expected.extend_from_slice(&24u32.to_le_bytes());
    expected.extend_from_slice(&170.1f32.to_le_bytes());
    expected.extend_from_slice(&5000u32.to_le_bytes());

    assert_eq!(bytes, expected);
    assert_eq!(bytes.len(), 26);
    rfm.close(handle).unwrap();
}

#[test]
fn update_to_smaller_record_stays_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    let schema = person_schema();
    let rid = rfm
        .insert(
            &mut handle,
            &schema,
            &[
                FieldValue::VarChar(b"Peters".to_vec()),
                FieldValue::Int(24),
                FieldValue::Real(170.1),
                FieldValue::Int(5000),
            ],
        )
        .unwrap();

    let updated = [
        FieldValue::VarChar(b"Newman".to_vec()),
        FieldValue::Int(24),
        FieldValue::Real(170.1),
        FieldValue::Int(100),
    ];
    rfm.update(&mut handle, &schema, rid, &updated).unwrap();

    let bytes = rfm.read(&mut handle, rid).unwrap();
    let mut expected = Vec::new();
    expected.extend_from_slice(&6u32.to_le_bytes());
    expected.extend_from_slice(b"Newman");
    expected.extend_from_slice(&24u32.to_le_bytes());
    expected.extend_from_slice(&170.1f32.to_le_bytes());
    expected.extend_from_slice(&100u32.to_le_bytes());
    assert_eq!(bytes, expected);

    rfm.close(handle).unwrap();
}

#[test]
fn update_that_overflows_the_page_forwards() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    let schema = vec![Attribute::varchar("blob", 4000)];

    // Fill one page with 200-byte records until the next insert would not fit.
    let filler = FieldValue::VarChar(vec![b'x'; 196]);
    let mut rids = Vec::new();
    loop {
        match rfm.insert(&mut handle, &schema, std::slice::from_ref(&filler)) {
            Ok(rid) => rids.push(rid),
            Err(StorageError::SizeTooLarge { .. }) => unreachable!("single record always fits"),
            Err(_) => break,
        }
        if rids.len() > 100 {
            break;
        }
    }
    assert!(!rids.is_empty());

    let target = rids[0];
    let big = [FieldValue::VarChar(vec![b'y'; 3000])];
    rfm.update(&mut handle, &schema, target, &big).unwrap();

    let bytes = rfm.read(&mut handle, target).unwrap();
    let len = LittleEndian::read_u32(&bytes[0..4]) as usize;
    assert_eq!(len, 3000);
    assert!(bytes[4..4 + len].iter().all(|&b| b == b'y'));

    rfm.delete(&mut handle, target).unwrap();
    let err = rfm.read(&mut handle, target).unwrap_err();
    assert!(matches!(err, StorageError::RecordNotFound));

    rfm.close(handle).unwrap();
}

#[test]
fn boundary_record_size_at_page_capacity() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    // footer(4) + one slot directory entry(4) = 8 bytes of overhead.
    let max_len = 4096 - 4 - 4 - 4; // minus the varchar length prefix itself
    let schema = vec![Attribute::varchar("blob", max_len as u32)];

    let exact = [FieldValue::VarChar(vec![b'a'; max_len])];
    rfm.insert(&mut handle, &schema, &exact).unwrap();

    let dir2 = TempDir::new().unwrap();
    let path2 = dir2.path().join("t2.tbl");
    rfm.create(&path2).unwrap();
    let mut handle2 = rfm.open(&path2).unwrap();
    let too_big = [FieldValue::VarChar(vec![b'a'; max_len + 1])];
    let err = rfm.insert(&mut handle2, &schema, &too_big).unwrap_err();
    assert!(matches!(err, StorageError::SizeTooLarge { .. }));

    rfm.close(handle).unwrap();
    rfm.close(handle2).unwrap();
}

#[test]
fn create_rejects_non_power_of_two_bucket_count() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("bad").to_string_lossy().into_owned();
    let err = HashIndex::create(&name, 3).unwrap_err();
    assert!(matches!(err, StorageError::InvalidInitialBucketCount(3)));

    let name_ok = dir.path().join("good").to_string_lossy().into_owned();
    HashIndex::create(&name_ok, 4).unwrap();
}

#[test]
fn empty_index_scan_returns_nothing() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("ix").to_string_lossy().into_owned();
    HashIndex::create(&name, 4).unwrap();
    let mut index = HashIndex::open(&name, AttrKind::Int).unwrap();

    let results: Vec<_> = index.scan(None, None, true, true).unwrap().collect();
    assert!(results.is_empty());

    index.close().unwrap();
}

#[test]
fn linear_hash_insert_10000_integer_keys() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("ix").to_string_lossy().into_owned();
    HashIndex::create(&name, 4).unwrap();
    let mut index = HashIndex::open(&name, AttrKind::Int).unwrap();

    let mut order: Vec<u32> = (0..10_000).collect();
    // Deterministic shuffle (LCG), no external RNG dependency needed here.
    let mut state: u64 = 0x2545F4914F6CDD1D;
    for i in (1..order.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        order.swap(i, j);
    }

    for &i in &order {
        index
            .insert_entry(KeyValue::Int(i as i32), Rid::new(i + 1, (i + 1) as u16 & 0xFFFF))
            .unwrap();
    }

    assert!(index.num_primary_pages() >= 4);
    let all = index.num_all_pages();
    let (entry_count, primary_page_count, overflow_page_count, deleted_overflow_page_count) =
        index.raw_counters();
    assert_eq!(entry_count, 10_000);
    assert_eq!(all, primary_page_count + (overflow_page_count - deleted_overflow_page_count) + 1);

    let results: Vec<_> = index
        .scan(None, Some(KeyValue::Int(5000)), true, true)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results.len(), 5001);

    index.close().unwrap();
}

#[test]
fn delete_during_scan_then_rescan_is_empty() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("ix").to_string_lossy().into_owned();
    HashIndex::create(&name, 4).unwrap();
    let mut index = HashIndex::open(&name, AttrKind::Int).unwrap();

    for i in 0u32..10_000 {
        index
            .insert_entry(KeyValue::Int(i as i32), Rid::new(i + 1, 1))
            .unwrap();
    }

    let matches: Vec<(KeyValue, Rid)> = index
        .scan(None, Some(KeyValue::Int(5000)), true, true)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(matches.len(), 5001);

    for (key, rid) in matches {
        index.delete_entry(key, rid).unwrap();
    }

    let rest: Vec<_> = index
        .scan(None, Some(KeyValue::Int(5000)), true, true)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(rest.is_empty());

    index.close().unwrap();
}

#[test]
fn varchar_exact_match_scan_is_stable_across_reopen() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("ix").to_string_lossy().into_owned();
    HashIndex::create(&name, 4).unwrap();
    let mut index = HashIndex::open(&name, AttrKind::VarChar).unwrap();

    let mut expected_rids: Vec<Rid> = Vec::new();
    for i in 0u32..5000 {
        let len = (i as usize % 26) + 1;
        let letter = (b'a' + (i % 26) as u8) as char;
        let key = KeyValue::VarChar(vec![letter as u8; len]);
        let rid = Rid::new(i + 1, 1);
        if len == 20 {
            expected_rids.push(rid);
        }
        index.insert_entry(key, rid).unwrap();
    }

    let bound = KeyValue::VarChar(vec![b'a'; 20]);
    // Only the letter 'a' entries of length 20 collide with this exact key —
    // scanning by equality must return exactly those whose key compares equal.
    let first_pass: Vec<(KeyValue, Rid)> = index
        .scan(Some(bound.clone()), Some(bound.clone()), true, true)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    for (key, _) in &first_pass {
        assert_eq!(key.compare(&bound).unwrap(), std::cmp::Ordering::Equal);
    }

    index.close().unwrap();

    let mut reopened = HashIndex::open(&name, AttrKind::VarChar).unwrap();
    let second_pass: Vec<(KeyValue, Rid)> = reopened
        .scan(Some(bound.clone()), Some(bound), true, true)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let mut first_rids: Vec<Rid> = first_pass.into_iter().map(|(_, r)| r).collect();
    let mut second_rids: Vec<Rid> = second_pass.into_iter().map(|(_, r)| r).collect();
    first_rids.sort_by_key(|r| (r.page, r.slot));
    second_rids.sort_by_key(|r| (r.page, r.slot));
    assert_eq!(first_rids, second_rids);

    reopened.close().unwrap();
}

#[test]
fn reorganize_page_preserves_rids_and_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    let schema = vec![Attribute::int("n")];
    let mut rids = Vec::new();
    for i in 0..50 {
        let rid = rfm.insert(&mut handle, &schema, &[FieldValue::Int(i)]).unwrap();
        rids.push((rid, i));
    }
    for (rid, _) in rids.iter().step_by(2) {
        rfm.delete(&mut handle, *rid).unwrap();
    }

    rfm.reorganize_page(&mut handle, 0).unwrap();

    for (rid, i) in rids.iter().skip(1).step_by(2) {
        let bytes = rfm.read(&mut handle, *rid).unwrap();
        assert_eq!(LittleEndian::read_i32(&bytes), *i);
    }

    rfm.close(handle).unwrap();
}

#[test]
fn scan_with_filter_and_projection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tbl");
    let mut rfm = RecordFileManager::new();
    rfm.create(&path).unwrap();
    let mut handle = rfm.open(&path).unwrap();

    let schema = vec![Attribute::int("id"), Attribute::real("score")];
    for i in 0..20 {
        rfm.insert(&mut handle, &schema, &[FieldValue::Int(i), FieldValue::Real(i as f32)])
            .unwrap();
    }

    let results: Vec<_> = rfm
        .scan(&mut handle, &schema, Some(("id", CompOp::Ge, FieldValue::Int(15))), &["id"])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results.len(), 5);

    rfm.close(handle).unwrap();
}
