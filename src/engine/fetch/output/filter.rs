use std::collections::HashMap;

use crate::engine::errors::AggregateFetchError;

use super::super::record::{CSV_CHANNEL_ID_COLUMN, CSV_DN_COLUMN, csv_field};

/// Order-preserving transformation applied to each output batch before it
/// reaches the sink. Filters must keep retained records in their input
/// order; a filter error is fatal to the run, since dropping a batch
/// silently would corrupt the output.
pub trait ChannelStreamFilter: Send {
    fn apply(&mut self, records: Vec<String>) -> Result<Vec<String>, AggregateFetchError>;
}

/// Drops records whose data number is unchanged since the previously emitted
/// record for the same channel. Rows that are not rendered CSV records
/// (headers, template output) pass through untouched.
#[derive(Debug, Default)]
pub struct ChangesOnlyFilter {
    last_dn: HashMap<String, String>,
}

impl ChangesOnlyFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelStreamFilter for ChangesOnlyFilter {
    fn apply(&mut self, records: Vec<String>) -> Result<Vec<String>, AggregateFetchError> {
        let mut kept = Vec::with_capacity(records.len());
        for line in records {
            let parsed = match (
                csv_field(&line, CSV_CHANNEL_ID_COLUMN),
                csv_field(&line, CSV_DN_COLUMN),
            ) {
                (Some(channel), Some(dn)) => Some((channel.to_string(), dn.to_string())),
                _ => None,
            };
            let Some((channel, dn)) = parsed else {
                kept.push(line);
                continue;
            };
            match self.last_dn.get(&channel) {
                Some(previous) if *previous == dn => {}
                _ => {
                    self.last_dn.insert(channel, dn);
                    kept.push(line);
                }
            }
        }
        Ok(kept)
    }
}
