use super::record::ChannelRecord;

/// Immutable pairing of a batch id and the records pulled for it. Created by
/// the query stream processor, consumed exactly once by a batch processor.
#[derive(Debug)]
pub struct RecordBatchContainer {
    pub batch_id: String,
    pub records: Vec<ChannelRecord>,
}

impl RecordBatchContainer {
    pub fn new(batch_id: String, records: Vec<ChannelRecord>) -> Self {
        Self { batch_id, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
