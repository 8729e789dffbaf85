use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::engine::errors::AggregateFetchError;

use super::super::container::RecordBatchContainer;
use super::super::coordinator::BatchIdAllocator;
use super::super::record::ChannelRecord;
use super::cursor::RecordCursor;

const LOG_TARGET: &str = "chanfetch::query::stream";
const YIELD_EVERY: usize = 64;

/// Pulls rows from the query cursor and groups them into fixed-size record
/// batches, dispatching each into the bounded processor queue. Runs as its
/// own task; blocking on a full queue is the backpressure path all the way
/// back to the cursor.
pub struct QueryStreamProcessor {
    cursor: Box<dyn RecordCursor>,
    chunk_size: usize,
    running: Arc<AtomicBool>,
}

impl QueryStreamProcessor {
    pub fn new(cursor: Box<dyn RecordCursor>, chunk_size: usize) -> Self {
        Self {
            cursor,
            chunk_size,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Liveness handle for shutdown coordination.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Pulls one chunk from the cursor. An empty chunk means the cursor is
    /// exhausted.
    fn batch_records(&mut self) -> Result<Vec<ChannelRecord>, AggregateFetchError> {
        let mut records = Vec::with_capacity(self.chunk_size);
        while records.len() < self.chunk_size {
            match self.cursor.next_record()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(records)
    }

    pub async fn run(
        mut self,
        ids: Arc<BatchIdAllocator>,
        batch_tx: Sender<RecordBatchContainer>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), AggregateFetchError> {
        self.running.store(true, Ordering::SeqCst);
        info!(target: LOG_TARGET, chunk_size = self.chunk_size, "Query stream processor started");

        let mut dispatched = 0usize;
        loop {
            if *shutdown.borrow() {
                info!(target: LOG_TARGET, "Query stream stopping on shutdown signal");
                break;
            }

            let records = self.batch_records().inspect_err(|_| {
                self.running.store(false, Ordering::SeqCst);
            })?;
            if records.is_empty() {
                info!(target: LOG_TARGET, batches = dispatched, "Query cursor exhausted");
                break;
            }

            let batch_id = ids.next_batch_id();
            debug!(
                target: LOG_TARGET,
                batch_id = %batch_id,
                records = records.len(),
                "Dispatching raw batch"
            );
            let container = RecordBatchContainer::new(batch_id, records);

            tokio::select! {
                res = batch_tx.send(container) => {
                    if res.is_err() {
                        self.running.store(false, Ordering::SeqCst);
                        return Err(AggregateFetchError::QueueClosed("batch processor queue"));
                    }
                }
                _ = shutdown.changed() => {
                    info!(target: LOG_TARGET, "Query stream cancelled while dispatching");
                    break;
                }
            }

            dispatched += 1;
            if dispatched % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}
