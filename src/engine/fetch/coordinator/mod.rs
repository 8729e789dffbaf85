mod coordinator;
mod ids;
mod state;

pub use coordinator::{AggregateQueryCoordinator, FetchSummary};
pub use ids::BatchIdAllocator;
pub use state::{CoordinatorState, StateCell};
