use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::engine::errors::AggregateFetchError;

use super::super::config::{AggregateFetchConfig, RECORD_PLACEHOLDER};
use super::super::container::RecordBatchContainer;
use super::super::record::ChannelRecord;
use super::info::{IndexEntry, ProcessedBatchInfo};
use super::writer::{BatchWriter, IndexWriter};

const LOG_TARGET: &str = "chanfetch::batch::processor";

/// Turns one raw record batch into a [`ProcessedBatchInfo`]: applies the
/// per-record filters, renders each surviving record with its sort key, sorts
/// the batch when the configured ordering requires it, and spills oversized
/// batches to a record/index file pair under the run's temp directory.
pub struct BatchProcessor {
    worker_id: usize,
    config: Arc<AggregateFetchConfig>,
    temp_dir: PathBuf,
    channel_filter: Option<HashSet<String>>,
}

impl BatchProcessor {
    pub fn new(worker_id: usize, config: Arc<AggregateFetchConfig>, temp_dir: PathBuf) -> Self {
        let channel_filter = if config.channel_ids.is_empty() {
            None
        } else {
            Some(config.channel_ids.iter().cloned().collect())
        };
        Self {
            worker_id,
            config,
            temp_dir,
            channel_filter,
        }
    }

    /// Processes one batch. An empty result (all records filtered away) still
    /// yields an info so downstream merge readiness never waits on the id.
    pub fn process(
        &self,
        container: RecordBatchContainer,
    ) -> Result<ProcessedBatchInfo, AggregateFetchError> {
        let batch_id = container.batch_id.clone();
        debug!(
            target: LOG_TARGET,
            worker_id = self.worker_id,
            batch_id = %batch_id,
            records = container.len(),
            "Processing batch"
        );

        let ordering = &self.config.ordering;
        let mut rendered: Vec<(String, String)> = Vec::with_capacity(container.len());
        for record in &container.records {
            if !self.passes_filters(record) {
                continue;
            }
            rendered.push((ordering.sort_key(record), self.render(record)));
        }

        if rendered.is_empty() {
            debug!(target: LOG_TARGET, batch_id = %batch_id, "Batch empty after filtering");
            return Ok(ProcessedBatchInfo::empty());
        }

        if ordering.requires_batch_sort() {
            // Stable, so equal keys keep their insertion order within the batch.
            rendered.sort_by(|a, b| ordering.compare(&a.0, &b.0));
        }

        if rendered.len() <= self.config.spill_record_threshold {
            let mut records = Vec::with_capacity(rendered.len());
            let mut index = Vec::with_capacity(rendered.len());
            for (pos, (key, line)) in rendered.into_iter().enumerate() {
                index.push(IndexEntry {
                    key,
                    offset: pos as u64,
                });
                records.push(line);
            }
            return Ok(ProcessedBatchInfo::in_memory(records, index));
        }

        self.spill(&batch_id, rendered)
    }

    fn spill(
        &self,
        batch_id: &str,
        rendered: Vec<(String, String)>,
    ) -> Result<ProcessedBatchInfo, AggregateFetchError> {
        let record_path = self.temp_dir.join(format!("{batch_id}.rec"));
        let index_path = self.temp_dir.join(format!("{batch_id}.idx"));

        let mut record_writer = BatchWriter::create(record_path.clone())?;
        let mut index_writer = IndexWriter::create(index_path.clone())?;

        let record_count = rendered.len();
        for (key, line) in rendered {
            let offset = record_writer.write(&line)?;
            index_writer.append(&IndexEntry { key, offset })?;
        }
        record_writer.close()?;
        index_writer.close()?;

        debug!(
            target: LOG_TARGET,
            worker_id = self.worker_id,
            batch_id = %batch_id,
            records = record_count,
            "Spilled batch to disk"
        );
        Ok(ProcessedBatchInfo::spilled(
            record_count,
            record_path,
            index_path,
        ))
    }

    fn passes_filters(&self, record: &ChannelRecord) -> bool {
        if let Some(channels) = &self.channel_filter {
            if !channels.contains(&record.channel_id) {
                return false;
            }
        }
        if let Some(pattern) = &self.config.module_pattern {
            match &record.module {
                Some(module) if module.contains(pattern.as_str()) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.config.time_range {
            if !range.contains(record.ert) {
                return false;
            }
        }
        if self.config.alarm_only && !record.is_in_alarm() {
            return false;
        }
        true
    }

    fn render(&self, record: &ChannelRecord) -> String {
        let csv = record.to_csv();
        match self.config.template.as_ref().and_then(|t| t.line.as_ref()) {
            Some(template) => template.replace(RECORD_PLACEHOLDER, &csv),
            None => csv,
        }
    }
}
