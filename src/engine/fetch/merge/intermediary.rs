use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::engine::errors::AggregateFetchError;

use super::super::batch::{BatchWriter, IndexEntry, IndexWriter, ProcessedBatchInfo};
use super::super::coordinator::AggregateQueryCoordinator;
use super::cursor::BatchCursor;
use super::kway::KWayMerger;

const LOG_TARGET: &str = "chanfetch::merge::intermediary";
const SHUTDOWN_CHECK_EVERY: usize = 1024;

/// Reduction rounds over the batch registry: partitions the registered batch
/// ids (arrival order) into fan-in sized groups and k-way merges each group
/// into one new spilled batch, concurrently, until the registry is small
/// enough for a single final pass.
pub struct IntermediaryMergeSort {
    coordinator: Arc<AggregateQueryCoordinator>,
}

impl IntermediaryMergeSort {
    pub fn new(coordinator: Arc<AggregateQueryCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn run(&self) -> Result<(), AggregateFetchError> {
        let c = &self.coordinator;
        let fan_in = c.config().batch_temp_file_threshold;
        let boundary = c.config().final_merge_batch_boundary;
        let mut round = 0usize;

        loop {
            round += 1;
            let ids = c.sorted_batch_ids();
            info!(
                target: LOG_TARGET,
                round,
                batches = ids.len(),
                "Starting intermediary merge round"
            );

            let mut handles = Vec::new();
            for group in ids.chunks(fan_in) {
                if group.len() < 2 {
                    continue;
                }
                c.intermediary_merge_started();
                let coordinator = Arc::clone(c);
                let group = group.to_vec();
                handles.push(tokio::spawn(
                    async move { merge_group(coordinator, group).await },
                ));
            }
            if handles.is_empty() {
                return Ok(());
            }

            for result in join_all(handles).await {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return Err(e),
                    Err(e) => return Err(AggregateFetchError::WorkerPanic(e.to_string())),
                }
            }

            if c.is_shutdown_requested() {
                return Err(AggregateFetchError::ShutdownRequested);
            }
            if c.batch_count() <= boundary {
                info!(
                    target: LOG_TARGET,
                    rounds = round,
                    batches = c.batch_count(),
                    "Registry reduced below final merge boundary"
                );
                return Ok(());
            }
        }
    }
}

async fn merge_group(
    coordinator: Arc<AggregateQueryCoordinator>,
    group: Vec<String>,
) -> Result<(), AggregateFetchError> {
    let result = merge_group_inner(&coordinator, &group).await;
    if result.is_err() {
        coordinator.intermediary_merge_aborted();
    }
    result
}

async fn merge_group_inner(
    c: &Arc<AggregateQueryCoordinator>,
    group: &[String],
) -> Result<(), AggregateFetchError> {
    let ordering = c.config().ordering.clone();

    let mut consumed: Vec<(String, Arc<ProcessedBatchInfo>)> = Vec::with_capacity(group.len());
    for id in group {
        let info = c.get_batch(id).ok_or_else(|| {
            AggregateFetchError::corrupt(id.clone(), "batch left the registry before its merge")
        })?;
        consumed.push((id.clone(), info));
    }

    let mut cursors = Vec::with_capacity(consumed.len());
    for (slot, (id, info)) in consumed.iter().enumerate() {
        cursors.push(BatchCursor::open(slot, id.clone(), Arc::clone(info))?);
    }

    let merged_id = c.next_merged_id();
    let record_path = c.temp_dir().join(format!("{merged_id}.rec"));
    let index_path = c.temp_dir().join(format!("{merged_id}.idx"));
    let mut record_writer = BatchWriter::create(record_path.clone())?;
    let mut index_writer = IndexWriter::create(index_path.clone())?;

    let mut merger = KWayMerger::new(&ordering, cursors)?;
    let mut count = 0usize;
    while let Some((key, line)) = merger.next_entry()? {
        let offset = record_writer.write(&line)?;
        index_writer.append(&IndexEntry { key, offset })?;
        count += 1;
        if count % SHUTDOWN_CHECK_EVERY == 0 {
            if c.is_shutdown_requested() {
                return Err(AggregateFetchError::ShutdownRequested);
            }
            tokio::task::yield_now().await;
        }
    }
    record_writer.close()?;
    index_writer.close()?;

    debug!(
        target: LOG_TARGET,
        merged_id = %merged_id,
        batches = consumed.len(),
        records = count,
        "Intermediary merge produced batch"
    );
    c.complete_intermediary_merge(
        &consumed,
        merged_id,
        ProcessedBatchInfo::spilled(count, record_path, index_path),
    );
    Ok(())
}
