use std::path::Path;

use crate::engine::fetch::batch::{BatchWriter, IndexEntry, IndexWriter, ProcessedBatchInfo};

/// Builder for processed batches from (sort key, record line) pairs, either
/// in memory or spilled to a record/index file pair on disk.
pub struct ProcessedBatchFactory {
    pairs: Vec<(String, String)>,
}

impl ProcessedBatchFactory {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn with_pairs(mut self, pairs: Vec<(&str, &str)>) -> Self {
        self.pairs = pairs
            .into_iter()
            .map(|(key, line)| (key.to_string(), line.to_string()))
            .collect();
        self
    }

    /// Fixed-width numeric sort keys with generated record lines, so lexical
    /// and numeric key order agree.
    pub fn with_numeric_keys(mut self, keys: &[u64]) -> Self {
        self.pairs = keys
            .iter()
            .map(|key| (format!("{key:020}"), format!("rec-{key}")))
            .collect();
        self
    }

    pub fn create_in_memory(self) -> ProcessedBatchInfo {
        let mut records = Vec::with_capacity(self.pairs.len());
        let mut index = Vec::with_capacity(self.pairs.len());
        for (pos, (key, line)) in self.pairs.into_iter().enumerate() {
            index.push(IndexEntry {
                key,
                offset: pos as u64,
            });
            records.push(line);
        }
        ProcessedBatchInfo::in_memory(records, index)
    }

    /// Writes the pairs to `<dir>/<batch_id>.rec` and `<dir>/<batch_id>.idx`.
    pub fn create_spilled(self, dir: &Path, batch_id: &str) -> ProcessedBatchInfo {
        let record_path = dir.join(format!("{batch_id}.rec"));
        let index_path = dir.join(format!("{batch_id}.idx"));

        let mut record_writer =
            BatchWriter::create(record_path.clone()).expect("record file opens");
        let mut index_writer = IndexWriter::create(index_path.clone()).expect("index file opens");

        let record_count = self.pairs.len();
        for (key, line) in self.pairs {
            let offset = record_writer.write(&line).expect("record line writes");
            index_writer
                .append(&IndexEntry { key, offset })
                .expect("index entry writes");
        }
        record_writer.close().expect("record file closes");
        index_writer.close().expect("index file closes");

        ProcessedBatchInfo::spilled(record_count, record_path, index_path)
    }
}
