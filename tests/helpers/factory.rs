use std::path::Path;

pub use super::factories::{
    BatchContainerFactory, ChannelRecordFactory, FetchConfigFactory, ProcessedBatchFactory,
    RecordCursorFactory,
};

pub struct Factory;

impl Factory {
    pub fn channel_record() -> ChannelRecordFactory {
        ChannelRecordFactory::new()
    }

    pub fn batch_container() -> BatchContainerFactory {
        BatchContainerFactory::new()
    }

    pub fn fetch_config(chunk_dir: &Path) -> FetchConfigFactory {
        FetchConfigFactory::new(chunk_dir)
    }

    pub fn processed_batch() -> ProcessedBatchFactory {
        ProcessedBatchFactory::new()
    }

    pub fn record_cursor() -> RecordCursorFactory {
        RecordCursorFactory::new()
    }
}
