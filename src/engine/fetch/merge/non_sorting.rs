use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::errors::AggregateFetchError;

use super::super::batch::{BatchData, BatchReader, ProcessedBatchInfo};
use super::super::coordinator::{AggregateQueryCoordinator, CoordinatorState};

const LOG_TARGET: &str = "chanfetch::merge::non_sorting";
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Arrival-order concatenation merge, used when the configured ordering is
/// exactly insertion order: batches are individually ordered and mutually
/// non-overlapping, so each one streams to the output queue as soon as it is
/// the head of the arrival queue and has been registered.
pub struct NonSortingMerge {
    coordinator: Arc<AggregateQueryCoordinator>,
}

impl NonSortingMerge {
    pub fn new(coordinator: Arc<AggregateQueryCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn run(self) -> Result<(), AggregateFetchError> {
        let c = &self.coordinator;
        let mut shutdown = c.subscribe_shutdown();
        let mut final_stage = false;
        info!(target: LOG_TARGET, "Non-sorting merge started");

        loop {
            if c.is_shutdown_requested() {
                return Ok(());
            }
            if !final_stage && c.collection_complete() {
                c.advance_state(CoordinatorState::MergingFinal);
                final_stage = true;
            }

            if let Some(batch_id) = c.pending_head() {
                if let Some(info) = c.get_batch(&batch_id) {
                    // Read while the batch is still registered; the registry
                    // hand-off is the file ownership boundary.
                    let records = batch_records(&batch_id, &info)?;
                    c.pop_pending();
                    c.remove_batch(&batch_id);
                    if !records.is_empty() {
                        c.push_batch_to_output_controller(records).await?;
                    }
                    info.delete_backing_files();
                    debug!(target: LOG_TARGET, batch_id = %batch_id, "Streamed batch to output");
                    continue;
                }
                if c.collection_complete() {
                    // Collection is over, so the head id can never be
                    // registered; only reachable when upstream failed.
                    warn!(
                        target: LOG_TARGET,
                        batch_id = %batch_id,
                        "Pending batch was never registered"
                    );
                    return Ok(());
                }
            } else if c.collection_complete() {
                info!(target: LOG_TARGET, "Non-sorting merge drained all batches");
                return Ok(());
            }

            tokio::select! {
                _ = sleep(POLL_INTERVAL) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

/// Materializes a batch's records, reading spilled batches back from disk.
fn batch_records(
    batch_id: &str,
    info: &ProcessedBatchInfo,
) -> Result<Vec<String>, AggregateFetchError> {
    match info.data() {
        BatchData::Memory { records, .. } => Ok(records.clone()),
        BatchData::Spilled { record_path, .. } => {
            let mut reader = BatchReader::open(batch_id, record_path)?;
            let mut records = Vec::with_capacity(info.record_count());
            while let Some(line) = reader.next_record()? {
                records.push(line);
            }
            if records.len() != info.record_count() {
                return Err(AggregateFetchError::corrupt(
                    batch_id,
                    format!(
                        "expected {} records, read {}",
                        info.record_count(),
                        records.len()
                    ),
                ));
            }
            Ok(records)
        }
    }
}
