use tempfile::tempdir;

use crate::test_helpers::factory::Factory;

#[test]
fn test_in_memory_batch() {
    let info = Factory::processed_batch()
        .with_numeric_keys(&[3, 1, 2])
        .create_in_memory();

    assert_eq!(info.record_count(), 3);
    assert!(!info.is_spilled());
    let (key, line) = info.pair_at(0).expect("first pair present");
    assert_eq!(key, format!("{:020}", 3));
    assert_eq!(line, "rec-3");
}

#[test]
fn test_spilled_batch_writes_file_pair() {
    let tmp = tempdir().expect("temp dir creates");
    let info = Factory::processed_batch()
        .with_numeric_keys(&[10, 20])
        .create_spilled(tmp.path(), "batch-00000001");

    assert_eq!(info.record_count(), 2);
    assert!(info.is_spilled());
    assert!(tmp.path().join("batch-00000001.rec").exists());
    assert!(tmp.path().join("batch-00000001.idx").exists());
}
