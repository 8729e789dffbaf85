use crate::test_helpers::factory::Factory;

#[test]
fn test_channel_record_factory() {
    let record = Factory::channel_record()
        .with_event_seq(7)
        .with_channel_id("P-0102")
        .with_module("POWER")
        .with_ert(2_000, 500)
        .with_dn("17")
        .with_alarm("RED")
        .create();

    assert_eq!(record.event_seq, 7);
    assert_eq!(record.channel_id, "P-0102");
    assert_eq!(record.module.as_deref(), Some("POWER"));
    assert_eq!(record.ert.coarse, 2_000);
    assert_eq!(record.ert.fine, 500);
    assert!(record.is_in_alarm());
}

#[test]
fn test_create_list_sequences_keys() {
    let records = Factory::channel_record()
        .with_event_seq(10)
        .with_ert(5_000, 0)
        .create_list(3);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].event_seq, 10);
    assert_eq!(records[2].event_seq, 12);
    assert_eq!(records[2].ert.coarse, 5_002);
}
