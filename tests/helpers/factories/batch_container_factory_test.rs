use crate::test_helpers::factory::Factory;

#[test]
fn test_batch_container_factory() {
    let container = Factory::batch_container()
        .with_batch_id("batch-00000042")
        .with_record_count(5)
        .create();

    assert_eq!(container.batch_id, "batch-00000042");
    assert_eq!(container.len(), 5);
    assert!(!container.is_empty());
}

#[test]
fn test_empty_container() {
    let container = Factory::batch_container().create();
    assert!(container.is_empty());
}
