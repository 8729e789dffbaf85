use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::engine::errors::AggregateFetchError;

use super::channel::{OutputItem, OutputReceiver};
use super::consumer::OutputConsumer;
use super::filter::ChannelStreamFilter;

const LOG_TARGET: &str = "chanfetch::output::controller";

/// Drains the output queue, applies the stream filter chain, and delivers
/// ordered records to the sink. Runs as its own task; exits on the explicit
/// end-of-stream signal or on shutdown, and never re-orders records.
pub struct OutputController {
    receiver: OutputReceiver,
    consumer: Box<dyn OutputConsumer>,
    filters: Vec<Box<dyn ChannelStreamFilter>>,
    running: Arc<AtomicBool>,
    shutdown: watch::Receiver<bool>,
}

impl OutputController {
    pub fn new(
        receiver: OutputReceiver,
        consumer: Box<dyn OutputConsumer>,
        filters: Vec<Box<dyn ChannelStreamFilter>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            receiver,
            consumer,
            filters,
            running: Arc::new(AtomicBool::new(false)),
            shutdown,
        }
    }

    /// Liveness handle for shutdown coordination.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Returns the number of records delivered to the sink.
    pub async fn run(mut self) -> Result<u64, AggregateFetchError> {
        self.running.store(true, Ordering::SeqCst);
        info!(target: LOG_TARGET, "Output controller started");
        let result = self.drain().await;
        self.running.store(false, Ordering::SeqCst);
        match &result {
            Ok(delivered) => {
                info!(target: LOG_TARGET, delivered, "Output controller finished")
            }
            Err(e) => error!(target: LOG_TARGET, error = %e, "Output controller failed"),
        }
        result
    }

    async fn drain(&mut self) -> Result<u64, AggregateFetchError> {
        let mut delivered = 0u64;
        loop {
            if *self.shutdown.borrow() {
                debug!(target: LOG_TARGET, "Output controller exiting on shutdown signal");
                return Ok(delivered);
            }

            let item = tokio::select! {
                item = self.receiver.recv() => item,
                _ = self.shutdown.changed() => {
                    debug!(target: LOG_TARGET, "Output controller cancelled while waiting");
                    return Ok(delivered);
                }
            };

            match item {
                Some(OutputItem::Batch(records)) => {
                    let mut records = records;
                    for filter in &mut self.filters {
                        records = filter.apply(records)?;
                    }
                    if !records.is_empty() {
                        self.consumer.consume(&records)?;
                        delivered += records.len() as u64;
                    }
                }
                Some(OutputItem::End) => {
                    self.consumer.finish()?;
                    debug!(target: LOG_TARGET, "Output controller observed end of stream");
                    return Ok(delivered);
                }
                None => {
                    debug!(target: LOG_TARGET, "Output queue senders dropped");
                    return Ok(delivered);
                }
            }
        }
    }
}
