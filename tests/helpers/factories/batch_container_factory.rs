use crate::engine::fetch::{ChannelRecord, RecordBatchContainer};

use super::channel_record_factory::ChannelRecordFactory;

/// Builder for raw record batch containers.
pub struct BatchContainerFactory {
    batch_id: String,
    records: Vec<ChannelRecord>,
}

impl BatchContainerFactory {
    pub fn new() -> Self {
        Self {
            batch_id: "batch-00000001".to_string(),
            records: Vec::new(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: &str) -> Self {
        self.batch_id = batch_id.to_string();
        self
    }

    pub fn with_records(mut self, records: Vec<ChannelRecord>) -> Self {
        self.records = records;
        self
    }

    /// Fills the container with `count` default records in sequence order.
    pub fn with_record_count(mut self, count: usize) -> Self {
        self.records = ChannelRecordFactory::new().create_list(count);
        self
    }

    pub fn create(self) -> RecordBatchContainer {
        RecordBatchContainer::new(self.batch_id, self.records)
    }
}
