use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::engine::errors::AggregateFetchError;

use super::super::ordering::{KeyComparison, OrderingSpec, compare_keys};
use super::cursor::BatchCursor;

/// Current head of one batch cursor. Ordering is inverted so the max-heap
/// pops the next record in output order; equal keys break on cursor slot,
/// then the record's index within its batch, which makes the merge fully
/// deterministic.
struct HeapEntry {
    key: String,
    line: String,
    slot: usize,
    record_idx: usize,
    comparison: KeyComparison,
    descending: bool,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut ord = compare_keys(self.comparison, &self.key, &other.key);
        if self.descending {
            ord = ord.reverse();
        }
        ord.then_with(|| self.slot.cmp(&other.slot))
            .then_with(|| self.record_idx.cmp(&other.record_idx))
            .reverse()
    }
}

/// Pull-based k-way merge over a set of batch cursors, supplied in batch
/// arrival order. Yields (sort key, record) pairs in the configured output
/// order.
pub struct KWayMerger {
    cursors: Vec<BatchCursor>,
    heap: BinaryHeap<HeapEntry>,
    comparison: KeyComparison,
    descending: bool,
}

impl KWayMerger {
    pub fn new(
        ordering: &OrderingSpec,
        mut cursors: Vec<BatchCursor>,
    ) -> Result<Self, AggregateFetchError> {
        let mut heap = BinaryHeap::with_capacity(cursors.len());
        for (slot, cursor) in cursors.iter_mut().enumerate() {
            debug_assert_eq!(slot, cursor.slot());
            if let Some((key, line)) = cursor.next_pair()? {
                heap.push(HeapEntry {
                    key,
                    line,
                    slot,
                    record_idx: 0,
                    comparison: ordering.comparison,
                    descending: ordering.descending,
                });
            }
        }
        Ok(Self {
            cursors,
            heap,
            comparison: ordering.comparison,
            descending: ordering.descending,
        })
    }

    /// The next merged (sort key, record) pair, or `None` when every cursor
    /// is exhausted.
    pub fn next_entry(&mut self) -> Result<Option<(String, String)>, AggregateFetchError> {
        let Some(entry) = self.heap.pop() else {
            return Ok(None);
        };

        let slot = entry.slot;
        if let Some((key, line)) = self.cursors[slot].next_pair()? {
            let record_idx = self.cursors[slot].yielded() - 1;
            self.heap.push(HeapEntry {
                key,
                line,
                slot,
                record_idx,
                comparison: self.comparison,
                descending: self.descending,
            });
        }

        Ok(Some((entry.key, entry.line)))
    }
}
