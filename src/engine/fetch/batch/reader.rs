use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::engine::errors::AggregateFetchError;

use super::info::IndexEntry;

/// Lazy, forward-only reader over a batch record file. Restartable only by
/// re-opening the file.
#[derive(Debug)]
pub struct BatchReader {
    batch_id: String,
    reader: BufReader<File>,
}

impl BatchReader {
    /// Opens the record file. A missing file means the batch was consumed or
    /// cleaned up while still registered, which is a fatal inconsistency.
    pub fn open(batch_id: &str, path: &Path) -> Result<Self, AggregateFetchError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AggregateFetchError::MissingBatchFile(path.to_path_buf())
            } else {
                AggregateFetchError::Io(e)
            }
        })?;
        Ok(Self {
            batch_id: batch_id.to_string(),
            reader: BufReader::new(file),
        })
    }

    /// The next record line, without its trailing newline. `None` at EOF.
    pub fn next_record(&mut self) -> Result<Option<String>, AggregateFetchError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(Some(line))
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }
}

/// Lazy reader over a batch's companion index file.
#[derive(Debug)]
pub struct IndexReader {
    batch_id: String,
    reader: BufReader<File>,
}

impl IndexReader {
    pub fn open(batch_id: &str, path: &Path) -> Result<Self, AggregateFetchError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AggregateFetchError::MissingBatchFile(path.to_path_buf())
            } else {
                AggregateFetchError::Io(e)
            }
        })?;
        Ok(Self {
            batch_id: batch_id.to_string(),
            reader: BufReader::new(file),
        })
    }

    /// The next index entry. `None` at a clean EOF; a partial entry is
    /// corruption, never silently tolerated.
    pub fn next_entry(&mut self) -> Result<Option<IndexEntry>, AggregateFetchError> {
        if self.reader.fill_buf()?.is_empty() {
            return Ok(None);
        }
        match bincode::deserialize_from(&mut self.reader) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => Err(AggregateFetchError::corrupt(
                self.batch_id.clone(),
                format!("index entry decode failed: {e}"),
            )),
        }
    }
}
