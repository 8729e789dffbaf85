use crate::engine::errors::AggregateFetchError;

use super::super::record::ChannelRecord;

/// Opaque forward-only source of channel records, typically backed by a
/// database result set. The pipeline only ever pulls the next row and
/// surfaces terminal errors; there is no rewind.
pub trait RecordCursor: Send {
    /// The next record, or `None` when the source is exhausted. An error is
    /// terminal: the coordinator shuts the whole fetch down.
    fn next_record(&mut self) -> Result<Option<ChannelRecord>, AggregateFetchError>;
}
