use crate::engine::errors::AggregateFetchError;
use crate::engine::fetch::query::RecordCursor;
use crate::test_helpers::factory::Factory;

#[test]
fn test_vec_cursor_yields_records_then_none() {
    let records = Factory::channel_record().create_list(2);
    let mut cursor = Factory::record_cursor().with_records(records).create();

    assert!(cursor.next_record().expect("first pull").is_some());
    assert!(cursor.next_record().expect("second pull").is_some());
    assert!(cursor.next_record().expect("exhausted pull").is_none());
}

#[test]
fn test_failing_cursor_errors_after_records() {
    let records = Factory::channel_record().create_list(1);
    let mut cursor = Factory::record_cursor()
        .with_records(records)
        .create_failing("connection lost");

    assert!(cursor.next_record().expect("first pull").is_some());
    let err = cursor.next_record().expect_err("cursor fails");
    assert!(matches!(err, AggregateFetchError::Cursor(_)));
}
