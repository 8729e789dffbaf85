use std::sync::Arc;

use dashmap::DashMap;

use super::info::ProcessedBatchInfo;

/// The shared map of batch id to processed batch, owned by the coordinator.
/// Every stage that produces or consumes batches goes through here; the
/// registry hand-off is also the ownership boundary for backing files.
#[derive(Debug, Default)]
pub struct BatchRegistry {
    map: DashMap<String, Arc<ProcessedBatchInfo>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, batch_id: String, info: ProcessedBatchInfo) {
        self.map.insert(batch_id, Arc::new(info));
    }

    pub fn get(&self, batch_id: &str) -> Option<Arc<ProcessedBatchInfo>> {
        self.map.get(batch_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, batch_id: &str) -> Option<Arc<ProcessedBatchInfo>> {
        self.map.remove(batch_id).map(|(_, info)| info)
    }

    pub fn contains(&self, batch_id: &str) -> bool {
        self.map.contains_key(batch_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Registered batch ids, sorted. Batch ids are zero-padded, so the sorted
    /// order is the arrival order (original batches before merged ones).
    pub fn sorted_batch_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.map.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Point-in-time snapshot of the whole registry.
    pub fn snapshot(&self) -> Vec<(String, Arc<ProcessedBatchInfo>)> {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Removes and returns everything, for terminal cleanup.
    pub fn drain(&self) -> Vec<(String, Arc<ProcessedBatchInfo>)> {
        let ids = self.sorted_batch_ids();
        ids.into_iter()
            .filter_map(|id| self.map.remove(&id))
            .collect()
    }
}
