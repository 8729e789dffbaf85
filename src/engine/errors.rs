use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems rejected before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("parallel thread count must be greater than zero")]
    ZeroParallelThreads,

    #[error("processor queue size must be greater than zero")]
    ZeroProcessorQueue,

    #[error("output queue size must be greater than zero")]
    ZeroOutputQueue,

    #[error("spill record threshold must be greater than zero")]
    ZeroSpillThreshold,

    #[error("batch temp file threshold must be at least 2, got {0}")]
    FanInTooSmall(usize),

    #[error("final merge batch boundary must be at least 2, got {0}")]
    FinalBoundaryTooSmall(usize),

    #[error("chunk directory must not be empty")]
    EmptyChunkDir,

    #[error("time range start is after stop")]
    InvalidTimeRange,

    #[error("template line must contain the {{record}} placeholder")]
    TemplateMissingPlaceholder,
}

/// Errors that abort an aggregate fetch. Every variant is fatal to the run:
/// the coordinator shuts all stages down rather than emit a partial result.
#[derive(Debug, Error)]
pub enum AggregateFetchError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("batch file missing: {0}")]
    MissingBatchFile(PathBuf),

    #[error("corrupt batch {batch_id}: {detail}")]
    CorruptBatch { batch_id: String, detail: String },

    #[error("query cursor error: {0}")]
    Cursor(String),

    #[error("output stream filter error: {0}")]
    Filter(String),

    #[error("{0} closed unexpectedly")]
    QueueClosed(&'static str),

    #[error("shutdown requested")]
    ShutdownRequested,

    #[error("worker task failed: {0}")]
    WorkerPanic(String),
}

impl AggregateFetchError {
    pub fn corrupt(batch_id: impl Into<String>, detail: impl Into<String>) -> Self {
        AggregateFetchError::CorruptBatch {
            batch_id: batch_id.into(),
            detail: detail.into(),
        }
    }
}
