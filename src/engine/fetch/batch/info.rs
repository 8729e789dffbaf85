use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const LOG_TARGET: &str = "chanfetch::batch::info";

/// One index entry per record line: the rendered sort key and the byte offset
/// of the line in the record file. For in-memory batches the offset is the
/// record's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub offset: u64,
}

/// Where a processed batch's records live. A batch is either held in memory
/// or spilled to a record/index file pair, never both.
#[derive(Debug)]
pub enum BatchData {
    Memory {
        records: Vec<String>,
        index: Vec<IndexEntry>,
    },
    Spilled {
        record_path: PathBuf,
        index_path: PathBuf,
    },
}

/// A batch after processing: rendered, ordered, and registered with the
/// coordinator under its batch id. Backing files are owned by whichever stage
/// currently holds the batch in the registry.
#[derive(Debug)]
pub struct ProcessedBatchInfo {
    record_count: usize,
    data: BatchData,
}

impl ProcessedBatchInfo {
    pub fn in_memory(records: Vec<String>, index: Vec<IndexEntry>) -> Self {
        debug_assert_eq!(records.len(), index.len());
        Self {
            record_count: records.len(),
            data: BatchData::Memory { records, index },
        }
    }

    pub fn spilled(record_count: usize, record_path: PathBuf, index_path: PathBuf) -> Self {
        Self {
            record_count,
            data: BatchData::Spilled {
                record_path,
                index_path,
            },
        }
    }

    /// A batch whose records were all filtered away.
    pub fn empty() -> Self {
        Self::in_memory(Vec::new(), Vec::new())
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self.data, BatchData::Spilled { .. })
    }

    pub fn data(&self) -> &BatchData {
        &self.data
    }

    /// The in-memory (key, record) pair at `pos`, if this batch is in memory
    /// and `pos` is in range.
    pub fn pair_at(&self, pos: usize) -> Option<(&str, &str)> {
        match &self.data {
            BatchData::Memory { records, index } => {
                Some((index.get(pos)?.key.as_str(), records.get(pos)?.as_str()))
            }
            BatchData::Spilled { .. } => None,
        }
    }

    /// Removes the batch's backing files, if any. Already-deleted files are
    /// fine; cleanup may run more than once.
    pub fn delete_backing_files(&self) {
        if let BatchData::Spilled {
            record_path,
            index_path,
        } = &self.data
        {
            remove_if_present(record_path);
            remove_if_present(index_path);
        }
    }
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(target: LOG_TARGET, path = %path.display(), "Deleted batch file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(target: LOG_TARGET, path = %path.display(), error = %e, "Failed to delete batch file")
        }
    }
}
