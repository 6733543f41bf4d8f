//! Fusion through real on-disk stores holding protobuf `Datum` records.

use assert_matches::assert_matches;
use latefusion::record::{Datum, DatumDecoder};
use latefusion::samples::SampleList;
use latefusion::{Error, ErrorPolicy, Evaluator, FusionDecoder, LevelDbStore, RecordStore, SledStore, StoreEngine};
use prost::Message;
use rusty_leveldb::{Options, DB};
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

/// Write `records` into a fresh sled database at `path`, keyed like the
/// feature extraction tool does (`000000`, `000001`, ...).
fn build_store(path: &Path, records: &[(usize, &[f32])]) {
    let db = sled::open(path).unwrap();
    for (index, scores) in records {
        let datum = Datum::from_scores(scores.len() as i32, 1, 1, scores);
        db.insert(format!("{:06}", index).as_bytes(), datum.encode_to_vec()).unwrap();
    }
    db.flush().unwrap();
}

fn build_leveldb_store(path: &Path, records: &[(usize, &[f32])]) {
    let mut options = Options::default();
    options.create_if_missing = true;
    let mut db = DB::open(path, options).unwrap();
    for (index, scores) in records {
        let datum = Datum::from_scores(scores.len() as i32, 1, 1, scores);
        db.put(format!("{:06}", index).as_bytes(), &datum.encode_to_vec()).unwrap();
    }
    db.flush().unwrap();
}

fn open_pair(root: &Path, rgb: &[(usize, &[f32])], depth: &[(usize, &[f32])]) -> (SledStore, SledStore) {
    let rgb_path = root.join("chalearn_isogr_rgb_test_rst");
    let depth_path = root.join("chalearn_isogr_depth_test_rst");
    build_store(&rgb_path, rgb);
    build_store(&depth_path, depth);
    (SledStore::open("rgb", &rgb_path).unwrap(), SledStore::open("depth", &depth_path).unwrap())
}

#[test]
fn tie_resolves_to_first_class() {
    let dir = tempdir().unwrap();
    let (rgb, depth) = open_pair(dir.path(), &[(0, &[0.25, 0.75, 0.1])], &[(0, &[0.75, 0.25, 0.3])]);
    let decoder = FusionDecoder::new(rgb, depth, DatumDecoder);

    let prediction = decoder.predict(0).unwrap();
    let fused = prediction.fused.values();
    assert_eq!(&fused[..2], &[0.5, 0.5]);
    assert!((fused[2] - 0.2).abs() < 1e-6);
    assert_eq!(prediction.label, 1);
}

#[test]
fn clear_winner_is_third_class() {
    let dir = tempdir().unwrap();
    let (rgb, depth) = open_pair(dir.path(), &[(0, &[0.1, 0.2, 0.9])], &[(0, &[0.1, 0.2, 0.3])]);
    let decoder = FusionDecoder::new(&rgb, &depth, DatumDecoder);

    let prediction = decoder.predict(0).unwrap();
    assert_eq!(prediction.label, 3);
    let expected = [0.1, 0.2, 0.6];
    for (got, want) in prediction.fused.values().iter().zip(expected) {
        assert!((got - want).abs() < 1e-6);
    }
}

#[test]
fn different_class_counts_are_rejected() {
    let dir = tempdir().unwrap();
    let (rgb, depth) = open_pair(dir.path(), &[(0, &[0.1, 0.2, 0.7])], &[(0, &[0.1, 0.2, 0.3, 0.4])]);
    let decoder = FusionDecoder::new(rgb, depth, DatumDecoder);

    assert_matches!(
        decoder.predict(0),
        Err(Error::ShapeMismatch { left, right }) if left == vec![3, 1, 1] && right == vec![4, 1, 1]
    );
}

#[test]
fn missing_depth_record_is_not_found() {
    let dir = tempdir().unwrap();
    let (rgb, depth) = open_pair(dir.path(), &[(5, &[0.4, 0.6])], &[(4, &[0.5, 0.5])]);
    assert!(rgb.get("000005").is_ok());
    let decoder = FusionDecoder::new(rgb, depth, DatumDecoder);

    assert_matches!(
        decoder.predict(5),
        Err(Error::NotFound { store, key }) if store == "depth" && key == "000005"
    );
}

#[test]
fn list_run_matches_store_order() {
    let dir = tempdir().unwrap();
    let (rgb, depth) = open_pair(
        dir.path(),
        &[(0, &[0.9, 0.05, 0.05]), (1, &[0.1, 0.8, 0.1]), (2, &[0.2, 0.2, 0.6])],
        &[(0, &[0.7, 0.2, 0.1]), (1, &[0.3, 0.3, 0.4]), (2, &[0.1, 0.8, 0.1])],
    );
    let decoder = FusionDecoder::new(rgb, depth, DatumDecoder);
    let list = "test/005/K_00801 37 1\ntest/005/K_00802 52 2\ntest/005/K_00803 29 3\n";
    let mut out = Vec::new();

    let summary = Evaluator::new(&decoder, ErrorPolicy::Abort)
        .with_ground_truth_column(Some(2))
        .run(SampleList::from_reader(Cursor::new(list)), &mut out)
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "test/005/K_00801 37 1 1\ntest/005/K_00802 52 2 2\ntest/005/K_00803 29 3 2\n"
    );
    assert_eq!(summary.correct, 2);
    assert_eq!(summary.evaluated, 3);
}

#[test]
fn leveldb_stores_fuse_like_sled_stores() {
    let dir = tempdir().unwrap();
    let rgb_path = dir.path().join("chalearn_isogr_rgb_test_rst");
    let depth_path = dir.path().join("chalearn_isogr_depth_test_rst");
    build_leveldb_store(&rgb_path, &[(0, &[0.25, 0.75, 0.1]), (1, &[0.1, 0.2, 0.9])]);
    build_leveldb_store(&depth_path, &[(0, &[0.75, 0.25, 0.3])]);

    let rgb = LevelDbStore::open("rgb", &rgb_path).unwrap();
    let depth = StoreEngine::LevelDb.open("depth", &depth_path).unwrap();
    let decoder = FusionDecoder::new(rgb, depth, DatumDecoder);

    assert_eq!(decoder.predict(0).unwrap().label, 1);
    assert_matches!(
        decoder.predict(1),
        Err(Error::NotFound { store, key }) if store == "depth" && key == "000001"
    );
}
