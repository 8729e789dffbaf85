use serde::Deserialize;

use crate::engine::errors::ConfigError;

use super::ordering::OrderingSpec;
use super::record::TimeTag;

/// Inclusive earth-receive-time window applied while batches are processed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TimeRange {
    pub start: Option<TimeTag>,
    pub stop: Option<TimeTag>,
}

impl TimeRange {
    pub fn contains(&self, time: TimeTag) -> bool {
        if let Some(start) = self.start {
            if time < start {
                return false;
            }
        }
        if let Some(stop) = self.stop {
            if time > stop {
                return false;
            }
        }
        true
    }
}

/// Header/line/trailer templating for rendered output. The line template is
/// applied per record with `{record}` substituted; header and trailer are
/// emitted verbatim around the record stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateSpec {
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,
}

pub const RECORD_PLACEHOLDER: &str = "{record}";

/// Everything one aggregate fetch needs, passed explicitly to the coordinator
/// at construction. Validated eagerly, before any worker starts.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateFetchConfig {
    /// Root directory for the run's temp files; each run creates its own
    /// subdirectory underneath.
    pub chunk_dir: String,

    /// Rows pulled from the cursor per batch.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Batch processor worker count.
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Capacity of the raw-batch queue between the query stream and the
    /// processor pool. This bound is the backpressure path to the cursor.
    #[serde(default = "default_processor_queue_size")]
    pub processor_queue_size: usize,

    /// Capacity of the merged-record queue feeding the output controller.
    #[serde(default = "default_output_queue_size")]
    pub output_queue_size: usize,

    /// Batches with more records than this are spilled to disk.
    #[serde(default = "default_spill_record_threshold")]
    pub spill_record_threshold: usize,

    /// Merge fan-in: how many batches one intermediary merge consumes, and
    /// how many the registry may hold before reduction rounds start.
    #[serde(default = "default_batch_temp_file_threshold")]
    pub batch_temp_file_threshold: usize,

    /// Reduction rounds repeat until the registry holds at most this many
    /// batches, at which point a single final merge pass can run.
    #[serde(default = "default_final_merge_batch_boundary")]
    pub final_merge_batch_boundary: usize,

    /// Leave the run's temp directory in place on shutdown, for debugging.
    #[serde(default)]
    pub keep_temp_files: bool,

    /// Upper bound on how long shutdown waits for workers to exit.
    #[serde(default = "default_shutdown_wait_ms")]
    pub shutdown_wait_ms: u64,

    #[serde(default)]
    pub ordering: OrderingSpec,

    /// Keep only these channel ids; empty means no channel filtering.
    #[serde(default)]
    pub channel_ids: Vec<String>,

    /// Keep only records whose module contains this substring.
    #[serde(default)]
    pub module_pattern: Option<String>,

    /// Keep only records whose earth-receive time falls in this window.
    #[serde(default)]
    pub time_range: Option<TimeRange>,

    /// Keep only records that are in alarm.
    #[serde(default)]
    pub alarm_only: bool,

    /// Drop records whose value is unchanged since the previous record for
    /// the same channel.
    #[serde(default)]
    pub changes_only: bool,

    /// Emit the CSV column header before the first record.
    #[serde(default)]
    pub show_column_header: bool,

    #[serde(default)]
    pub template: Option<TemplateSpec>,
}

fn default_chunk_size() -> usize {
    5000
}

fn default_parallel_threads() -> usize {
    4
}

fn default_processor_queue_size() -> usize {
    16
}

fn default_output_queue_size() -> usize {
    64
}

fn default_spill_record_threshold() -> usize {
    10_000
}

fn default_batch_temp_file_threshold() -> usize {
    10
}

fn default_final_merge_batch_boundary() -> usize {
    20
}

fn default_shutdown_wait_ms() -> u64 {
    10_000
}

impl AggregateFetchConfig {
    /// A config with defaults for everything but the temp-file root.
    pub fn new(chunk_dir: impl Into<String>) -> Self {
        Self {
            chunk_dir: chunk_dir.into(),
            chunk_size: default_chunk_size(),
            parallel_threads: default_parallel_threads(),
            processor_queue_size: default_processor_queue_size(),
            output_queue_size: default_output_queue_size(),
            spill_record_threshold: default_spill_record_threshold(),
            batch_temp_file_threshold: default_batch_temp_file_threshold(),
            final_merge_batch_boundary: default_final_merge_batch_boundary(),
            keep_temp_files: false,
            shutdown_wait_ms: default_shutdown_wait_ms(),
            ordering: OrderingSpec::default(),
            channel_ids: Vec::new(),
            module_pattern: None,
            time_range: None,
            alarm_only: false,
            changes_only: false,
            show_column_header: false,
            template: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_dir.trim().is_empty() {
            return Err(ConfigError::EmptyChunkDir);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.parallel_threads == 0 {
            return Err(ConfigError::ZeroParallelThreads);
        }
        if self.processor_queue_size == 0 {
            return Err(ConfigError::ZeroProcessorQueue);
        }
        if self.output_queue_size == 0 {
            return Err(ConfigError::ZeroOutputQueue);
        }
        if self.spill_record_threshold == 0 {
            return Err(ConfigError::ZeroSpillThreshold);
        }
        if self.batch_temp_file_threshold < 2 {
            return Err(ConfigError::FanInTooSmall(self.batch_temp_file_threshold));
        }
        if self.final_merge_batch_boundary < 2 {
            return Err(ConfigError::FinalBoundaryTooSmall(
                self.final_merge_batch_boundary,
            ));
        }
        if let Some(range) = &self.time_range {
            if let (Some(start), Some(stop)) = (range.start, range.stop) {
                if start > stop {
                    return Err(ConfigError::InvalidTimeRange);
                }
            }
        }
        if let Some(template) = &self.template {
            if let Some(line) = &template.line {
                if !line.contains(RECORD_PLACEHOLDER) {
                    return Err(ConfigError::TemplateMissingPlaceholder);
                }
            }
        }
        Ok(())
    }
}
