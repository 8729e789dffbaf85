use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Monotonic, collision-free batch id allocation, plus the arrival-order
/// queue the concatenating merge drains. Ids are zero-padded decimals so the
/// lexical order of ids equals their allocation order, and merged ids sort
/// after every raw-batch id.
#[derive(Debug, Default)]
pub struct BatchIdAllocator {
    batch_counter: AtomicU64,
    merged_counter: AtomicU64,
    pending: Mutex<VecDeque<String>>,
}

impl BatchIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next raw-batch id and appends it to the pending queue.
    pub fn next_batch_id(&self) -> String {
        let n = self.batch_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("batch-{n:08}");
        self.pending.lock().push_back(id.clone());
        id
    }

    /// Allocates an id for an intermediary merged batch.
    pub fn next_merged_id(&self) -> String {
        let n = self.merged_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("merged-{n:08}")
    }

    pub fn pending_head(&self) -> Option<String> {
        self.pending.lock().front().cloned()
    }

    pub fn pop_pending(&self) -> Option<String> {
        self.pending.lock().pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn pending_is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// How many raw batches have been allocated so far.
    pub fn batches_allocated(&self) -> u64 {
        self.batch_counter.load(Ordering::SeqCst)
    }
}
