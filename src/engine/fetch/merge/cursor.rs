use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::errors::AggregateFetchError;

use super::super::batch::{BatchData, BatchReader, IndexReader, ProcessedBatchInfo};

/// Lazy (sort key, record) stream over one processed batch, uniform across
/// in-memory and spilled batches. Cursors are handed to the k-way merge in
/// batch arrival order; `slot` is the cursor's position in that order and the
/// merge's tie-break.
#[derive(Debug)]
pub struct BatchCursor {
    batch_id: String,
    slot: usize,
    expected: usize,
    yielded: usize,
    kind: CursorKind,
}

#[derive(Debug)]
enum CursorKind {
    Memory {
        info: Arc<ProcessedBatchInfo>,
        pos: usize,
    },
    Spilled {
        records: BatchReader,
        index: IndexReader,
    },
}

impl BatchCursor {
    pub fn open(
        slot: usize,
        batch_id: String,
        info: Arc<ProcessedBatchInfo>,
    ) -> Result<Self, AggregateFetchError> {
        let expected = info.record_count();
        let spilled_paths: Option<(PathBuf, PathBuf)> = match info.data() {
            BatchData::Spilled {
                record_path,
                index_path,
            } => Some((record_path.clone(), index_path.clone())),
            BatchData::Memory { .. } => None,
        };
        let kind = match spilled_paths {
            Some((record_path, index_path)) => CursorKind::Spilled {
                records: BatchReader::open(&batch_id, &record_path)?,
                index: IndexReader::open(&batch_id, &index_path)?,
            },
            None => CursorKind::Memory { info, pos: 0 },
        };
        Ok(Self {
            batch_id,
            slot,
            expected,
            yielded: 0,
            kind,
        })
    }

    /// The next (sort key, record) pair, or `None` once the batch is
    /// exhausted. A record/index mismatch or a short file is corruption.
    pub fn next_pair(&mut self) -> Result<Option<(String, String)>, AggregateFetchError> {
        let pair = match &mut self.kind {
            CursorKind::Memory { info, pos } => match info.pair_at(*pos) {
                Some((key, line)) => {
                    *pos += 1;
                    Some((key.to_string(), line.to_string()))
                }
                None => None,
            },
            CursorKind::Spilled { records, index } => match records.next_record()? {
                Some(line) => {
                    let entry = index.next_entry()?.ok_or_else(|| {
                        AggregateFetchError::corrupt(
                            self.batch_id.clone(),
                            "index shorter than record file",
                        )
                    })?;
                    Some((entry.key, line))
                }
                None => {
                    if index.next_entry()?.is_some() {
                        return Err(AggregateFetchError::corrupt(
                            self.batch_id.clone(),
                            "index longer than record file",
                        ));
                    }
                    None
                }
            },
        };

        match pair {
            Some(pair) => {
                self.yielded += 1;
                Ok(Some(pair))
            }
            None => {
                if self.yielded != self.expected {
                    return Err(AggregateFetchError::corrupt(
                        self.batch_id.clone(),
                        format!("expected {} records, read {}", self.expected, self.yielded),
                    ));
                }
                Ok(None)
            }
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Records yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}
