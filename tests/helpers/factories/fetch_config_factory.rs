use std::path::Path;

use crate::engine::fetch::config::{TemplateSpec, TimeRange};
use crate::engine::fetch::{AggregateFetchConfig, KeyComparison, OrderKey, OrderingSpec};

/// Builder for fetch configurations sized for tests: small chunks, small
/// queues, and spilling left to each test to enable.
pub struct FetchConfigFactory {
    config: AggregateFetchConfig,
}

impl FetchConfigFactory {
    pub fn new(chunk_dir: &Path) -> Self {
        let mut config = AggregateFetchConfig::new(chunk_dir.to_string_lossy().to_string());
        config.chunk_size = 10;
        config.parallel_threads = 2;
        config.processor_queue_size = 4;
        config.output_queue_size = 8;
        Self { config }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn with_parallel_threads(mut self, parallel_threads: usize) -> Self {
        self.config.parallel_threads = parallel_threads;
        self
    }

    pub fn with_processor_queue_size(mut self, size: usize) -> Self {
        self.config.processor_queue_size = size;
        self
    }

    pub fn with_output_queue_size(mut self, size: usize) -> Self {
        self.config.output_queue_size = size;
        self
    }

    pub fn with_spill_record_threshold(mut self, threshold: usize) -> Self {
        self.config.spill_record_threshold = threshold;
        self
    }

    pub fn with_batch_temp_file_threshold(mut self, threshold: usize) -> Self {
        self.config.batch_temp_file_threshold = threshold;
        self
    }

    pub fn with_final_merge_batch_boundary(mut self, boundary: usize) -> Self {
        self.config.final_merge_batch_boundary = boundary;
        self
    }

    pub fn with_keep_temp_files(mut self) -> Self {
        self.config.keep_temp_files = true;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingSpec) -> Self {
        self.config.ordering = ordering;
        self
    }

    pub fn with_order_key(mut self, key: OrderKey) -> Self {
        self.config.ordering.key = key;
        self
    }

    pub fn descending(mut self) -> Self {
        self.config.ordering.descending = true;
        self
    }

    pub fn with_comparison(mut self, comparison: KeyComparison) -> Self {
        self.config.ordering.comparison = comparison;
        self
    }

    pub fn with_channel_ids(mut self, channel_ids: &[&str]) -> Self {
        self.config.channel_ids = channel_ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_module_pattern(mut self, pattern: &str) -> Self {
        self.config.module_pattern = Some(pattern.to_string());
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.config.time_range = Some(range);
        self
    }

    pub fn alarm_only(mut self) -> Self {
        self.config.alarm_only = true;
        self
    }

    pub fn changes_only(mut self) -> Self {
        self.config.changes_only = true;
        self
    }

    pub fn with_column_header(mut self) -> Self {
        self.config.show_column_header = true;
        self
    }

    pub fn with_template(mut self, template: TemplateSpec) -> Self {
        self.config.template = Some(template);
        self
    }

    pub fn create(self) -> AggregateFetchConfig {
        self.config
    }
}
