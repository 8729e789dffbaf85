use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

const LOG_TARGET: &str = "chanfetch::coordinator::state";

/// Lifecycle of one aggregate fetch. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum CoordinatorState {
    /// Batches arriving from the query stream.
    Collecting = 0,
    /// Reduction rounds running over the registry.
    MergingIntermediate = 1,
    /// Final merge pushing ordered output.
    MergingFinal = 2,
    /// Output controller still consuming the queue.
    Draining = 3,
    Shutdown = 4,
}

impl CoordinatorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CoordinatorState::Collecting,
            1 => CoordinatorState::MergingIntermediate,
            2 => CoordinatorState::MergingFinal,
            3 => CoordinatorState::Draining,
            _ => CoordinatorState::Shutdown,
        }
    }
}

/// Atomic state holder. A stale transition (e.g. a merge task advancing
/// after shutdown began) is ignored rather than moving the state backwards.
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(CoordinatorState::Collecting as u8))
    }

    pub fn get(&self) -> CoordinatorState {
        CoordinatorState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn advance(&self, next: CoordinatorState) {
        let mut current = self.0.load(Ordering::SeqCst);
        while current < next as u8 {
            match self
                .0
                .compare_exchange(current, next as u8, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    debug!(
                        target: LOG_TARGET,
                        from = ?CoordinatorState::from_u8(current),
                        to = ?next,
                        "State transition"
                    );
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }
}
