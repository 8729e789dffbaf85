use std::path::Path;

use super::config::{TemplateSpec, TimeRange};
use super::record::TimeTag;
use crate::engine::errors::ConfigError;
use crate::test_helpers::factory::Factory;

fn base() -> super::config::AggregateFetchConfig {
    Factory::fetch_config(Path::new("/tmp/chanfetch-test")).create()
}

#[test]
fn factory_defaults_pass_validation() {
    base().validate().expect("defaults validate");
}

#[test]
fn zero_sized_knobs_are_rejected() {
    let mut config = base();
    config.chunk_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroChunkSize)
    ));

    let mut config = base();
    config.parallel_threads = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroParallelThreads)
    ));

    let mut config = base();
    config.processor_queue_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroProcessorQueue)
    ));

    let mut config = base();
    config.output_queue_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroOutputQueue)
    ));

    let mut config = base();
    config.spill_record_threshold = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroSpillThreshold)
    ));
}

#[test]
fn merge_fan_in_must_allow_a_real_merge() {
    let mut config = base();
    config.batch_temp_file_threshold = 1;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::FanInTooSmall(1))
    ));

    let mut config = base();
    config.final_merge_batch_boundary = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::FinalBoundaryTooSmall(0))
    ));
}

#[test]
fn blank_chunk_dir_is_rejected() {
    let mut config = base();
    config.chunk_dir = "   ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::EmptyChunkDir)));
}

#[test]
fn inverted_time_range_is_rejected() {
    let mut config = base();
    config.time_range = Some(TimeRange {
        start: Some(TimeTag::new(2_000, 0)),
        stop: Some(TimeTag::new(1_000, 0)),
    });
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeRange)
    ));
}

#[test]
fn half_open_time_range_is_accepted() {
    let mut config = base();
    config.time_range = Some(TimeRange {
        start: Some(TimeTag::new(1_000, 0)),
        stop: None,
    });
    config.validate().expect("open-ended range validates");
}

#[test]
fn line_template_requires_the_record_placeholder() {
    let mut config = base();
    config.template = Some(TemplateSpec {
        header: Some("# report".to_string()),
        line: Some("no placeholder here".to_string()),
        trailer: None,
    });
    assert!(matches!(
        config.validate(),
        Err(ConfigError::TemplateMissingPlaceholder)
    ));

    let mut config = base();
    config.template = Some(TemplateSpec {
        header: None,
        line: Some("row: {record}".to_string()),
        trailer: None,
    });
    config.validate().expect("placeholder template validates");
}

#[test]
fn time_range_contains_is_inclusive() {
    let range = TimeRange {
        start: Some(TimeTag::new(100, 0)),
        stop: Some(TimeTag::new(200, 0)),
    };
    assert!(range.contains(TimeTag::new(100, 0)));
    assert!(range.contains(TimeTag::new(200, 0)));
    assert!(!range.contains(TimeTag::new(99, 999_999_999)));
    assert!(!range.contains(TimeTag::new(200, 1)));
}
