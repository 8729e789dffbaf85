use std::collections::VecDeque;

use crate::engine::errors::AggregateFetchError;
use crate::engine::fetch::ChannelRecord;
use crate::engine::fetch::query::RecordCursor;

/// Forward-only cursor over a fixed list of records.
pub struct VecCursor {
    records: VecDeque<ChannelRecord>,
}

impl RecordCursor for VecCursor {
    fn next_record(&mut self) -> Result<Option<ChannelRecord>, AggregateFetchError> {
        Ok(self.records.pop_front())
    }
}

/// Yields its records, then fails with a terminal cursor error.
pub struct FailingCursor {
    records: VecDeque<ChannelRecord>,
    message: String,
}

impl RecordCursor for FailingCursor {
    fn next_record(&mut self) -> Result<Option<ChannelRecord>, AggregateFetchError> {
        match self.records.pop_front() {
            Some(record) => Ok(Some(record)),
            None => Err(AggregateFetchError::Cursor(self.message.clone())),
        }
    }
}

/// Builder for test record cursors.
pub struct RecordCursorFactory {
    records: Vec<ChannelRecord>,
}

impl RecordCursorFactory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<ChannelRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn create(self) -> VecCursor {
        VecCursor {
            records: self.records.into(),
        }
    }

    /// A cursor that errors out once the supplied records run dry.
    pub fn create_failing(self, message: &str) -> FailingCursor {
        FailingCursor {
            records: self.records.into(),
            message: message.to_string(),
        }
    }
}
