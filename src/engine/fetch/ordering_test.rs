use std::cmp::Ordering;

use super::ordering::{KeyComparison, MergeStrategy, OrderKey, OrderingSpec, compare_keys};
use crate::test_helpers::factory::Factory;

#[test]
fn sort_key_tracks_the_configured_field() {
    let record = Factory::channel_record()
        .with_event_seq(77)
        .with_channel_id("C-0009")
        .with_module("GNC")
        .with_ert(1_234, 56)
        .with_sclk(900, 1)
        .create();

    let mut spec = OrderingSpec::default();
    assert_eq!(spec.sort_key(&record), format!("{:020}", 77));

    spec.key = OrderKey::Ert;
    assert_eq!(spec.sort_key(&record), record.ert.render());

    spec.key = OrderKey::Sclk;
    assert_eq!(spec.sort_key(&record), record.sclk.render());

    spec.key = OrderKey::ChannelId;
    assert_eq!(spec.sort_key(&record), "C-0009");

    spec.key = OrderKey::Module;
    assert_eq!(spec.sort_key(&record), "GNC");
}

#[test]
fn missing_module_renders_an_empty_key() {
    let record = Factory::channel_record().without_module().create();
    let spec = OrderingSpec {
        key: OrderKey::Module,
        ..OrderingSpec::default()
    };
    assert_eq!(spec.sort_key(&record), "");
}

#[test]
fn numeric_comparison_orders_by_value_not_text() {
    assert_eq!(compare_keys(KeyComparison::Numeric, "2", "10"), Ordering::Less);
    assert_eq!(
        compare_keys(KeyComparison::Lexical, "2", "10"),
        Ordering::Greater
    );
}

#[test]
fn numeric_comparison_understands_coarse_fine_keys() {
    assert_eq!(
        compare_keys(KeyComparison::Numeric, "100.5", "100.10"),
        Ordering::Less
    );
    assert_eq!(
        compare_keys(KeyComparison::Numeric, "101.0", "100.999"),
        Ordering::Greater
    );
}

#[test]
fn non_numeric_keys_under_numeric_config_fall_back_to_lexical() {
    assert_eq!(
        compare_keys(KeyComparison::Numeric, "A-0001", "B-0001"),
        Ordering::Less
    );
}

#[test]
fn descending_spec_reverses_comparisons() {
    let spec = OrderingSpec {
        descending: true,
        ..OrderingSpec::default()
    };
    assert_eq!(spec.compare("1", "2"), Ordering::Greater);
    assert_eq!(spec.compare("2", "1"), Ordering::Less);
    assert_eq!(spec.compare("1", "1"), Ordering::Equal);
}

#[test]
fn only_ascending_insertion_order_concatenates() {
    let insertion = OrderingSpec::default();
    assert_eq!(insertion.merge_strategy(), MergeStrategy::Concatenate);
    assert!(!insertion.requires_batch_sort());

    let descending = OrderingSpec {
        descending: true,
        ..OrderingSpec::default()
    };
    assert_eq!(descending.merge_strategy(), MergeStrategy::KWay);

    let by_time = OrderingSpec {
        key: OrderKey::Ert,
        ..OrderingSpec::default()
    };
    assert_eq!(by_time.merge_strategy(), MergeStrategy::KWay);
    assert!(by_time.requires_batch_sort());
}
