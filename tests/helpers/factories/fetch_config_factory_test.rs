use std::path::Path;

use crate::engine::fetch::{MergeStrategy, OrderKey};
use crate::test_helpers::factory::Factory;

#[test]
fn test_fetch_config_factory_defaults_validate() {
    let config = Factory::fetch_config(Path::new("/tmp/chanfetch-test")).create();

    config.validate().expect("factory defaults validate");
    assert_eq!(config.chunk_size, 10);
    assert_eq!(config.parallel_threads, 2);
    assert_eq!(config.ordering.merge_strategy(), MergeStrategy::Concatenate);
}

#[test]
fn test_fetch_config_factory_overrides() {
    let config = Factory::fetch_config(Path::new("/tmp/chanfetch-test"))
        .with_order_key(OrderKey::Ert)
        .with_batch_temp_file_threshold(2)
        .with_spill_record_threshold(1)
        .create();

    assert_eq!(config.ordering.merge_strategy(), MergeStrategy::KWay);
    assert_eq!(config.batch_temp_file_threshold, 2);
    assert_eq!(config.spill_record_threshold, 1);
}
