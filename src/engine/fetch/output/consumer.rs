use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::errors::AggregateFetchError;

/// Terminal sink for ordered, rendered records. Consumers receive records
/// exactly in output order and must not reorder them.
pub trait OutputConsumer: Send {
    fn consume(&mut self, records: &[String]) -> Result<(), AggregateFetchError>;

    /// Called once after the last record of a clean run.
    fn finish(&mut self) -> Result<(), AggregateFetchError> {
        Ok(())
    }
}

/// Writes one record per line to a file.
pub struct FileRecordWriter {
    writer: BufWriter<File>,
}

impl FileRecordWriter {
    pub fn create(path: PathBuf) -> Result<Self, AggregateFetchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            writer: BufWriter::new(File::create(&path)?),
        })
    }
}

impl OutputConsumer for FileRecordWriter {
    fn consume(&mut self, records: &[String]) -> Result<(), AggregateFetchError> {
        for record in records {
            self.writer.write_all(record.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AggregateFetchError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects records in memory for programmatic callers.
#[derive(Debug, Default)]
pub struct MemoryRecordCollector {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemoryRecordCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the collected records, usable after the run.
    pub fn handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.records)
    }
}

impl OutputConsumer for MemoryRecordCollector {
    fn consume(&mut self, records: &[String]) -> Result<(), AggregateFetchError> {
        self.records.lock().extend(records.iter().cloned());
        Ok(())
    }
}
