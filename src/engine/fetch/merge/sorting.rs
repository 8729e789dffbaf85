use std::sync::Arc;

use tracing::info;

use crate::engine::errors::AggregateFetchError;

use super::super::batch::ProcessedBatchInfo;
use super::super::coordinator::AggregateQueryCoordinator;
use super::cursor::BatchCursor;
use super::kway::KWayMerger;

const LOG_TARGET: &str = "chanfetch::merge::sorting";

/// Final merge pass: k-way merges every remaining registered batch straight
/// to the output queue in chunk-size slices. Runs once, after collection is
/// done and any reduction rounds have brought the registry within the
/// single-pass boundary.
pub struct SortingMerge {
    coordinator: Arc<AggregateQueryCoordinator>,
}

impl SortingMerge {
    pub fn new(coordinator: Arc<AggregateQueryCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Returns the number of records pushed to the output queue.
    pub async fn run(&self) -> Result<u64, AggregateFetchError> {
        let c = &self.coordinator;
        let chunk_size = c.config().chunk_size;
        let ordering = c.config().ordering.clone();

        let ids = c.sorted_batch_ids();
        info!(target: LOG_TARGET, batches = ids.len(), "Final merge starting");

        let mut consumed: Vec<(String, Arc<ProcessedBatchInfo>)> = Vec::with_capacity(ids.len());
        for id in ids {
            let info = c.get_batch(&id).ok_or_else(|| {
                AggregateFetchError::corrupt(id.clone(), "batch left the registry before its merge")
            })?;
            consumed.push((id, info));
        }

        let mut cursors = Vec::with_capacity(consumed.len());
        for (slot, (id, info)) in consumed.iter().enumerate() {
            cursors.push(BatchCursor::open(slot, id.clone(), Arc::clone(info))?);
        }

        let mut merger = KWayMerger::new(&ordering, cursors)?;
        let mut slice = Vec::with_capacity(chunk_size);
        let mut emitted = 0u64;
        while let Some((_key, line)) = merger.next_entry()? {
            slice.push(line);
            emitted += 1;
            if slice.len() == chunk_size {
                c.push_batch_to_output_controller(std::mem::replace(
                    &mut slice,
                    Vec::with_capacity(chunk_size),
                ))
                .await?;
            }
        }
        if !slice.is_empty() {
            c.push_batch_to_output_controller(slice).await?;
        }

        for (id, info) in consumed {
            c.remove_batch(&id);
            info.delete_backing_files();
        }

        info!(target: LOG_TARGET, records = emitted, "Final merge complete");
        Ok(emitted)
    }
}
