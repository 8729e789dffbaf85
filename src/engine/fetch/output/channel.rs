use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::mpsc;

/// One unit of work for the output controller. `End` is the explicit
/// end-of-stream signal pushed after the final merge completes; there is no
/// in-band empty-batch sentinel.
#[derive(Debug)]
pub enum OutputItem {
    Batch(Vec<String>),
    End,
}

/// Depth and throughput counters for the output queue, shared between the
/// sender and receiver halves.
#[derive(Debug, Default)]
pub struct OutputQueueMetrics {
    depth: AtomicUsize,
    records_sent: AtomicU64,
    records_received: AtomicU64,
}

impl OutputQueueMetrics {
    /// Items enqueued or about to be enqueued.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn records_sent(&self) -> u64 {
        self.records_sent.load(Ordering::SeqCst)
    }

    pub fn records_received(&self) -> u64 {
        self.records_received.load(Ordering::SeqCst)
    }

    fn on_send(&self, records: u64) {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.records_sent.fetch_add(records, Ordering::SeqCst);
    }

    fn on_send_failed(&self, records: u64) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        self.records_sent.fetch_sub(records, Ordering::SeqCst);
    }

    fn on_receive(&self, records: u64) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        self.records_received.fetch_add(records, Ordering::SeqCst);
    }
}

fn item_records(item: &OutputItem) -> u64 {
    match item {
        OutputItem::Batch(records) => records.len() as u64,
        OutputItem::End => 0,
    }
}

#[derive(Clone, Debug)]
pub struct OutputSender {
    inner: mpsc::Sender<OutputItem>,
    metrics: Arc<OutputQueueMetrics>,
}

impl OutputSender {
    /// Bounded send: blocks the producing merge task while the queue is
    /// full, which is the backpressure path from the sink all the way back
    /// to the query cursor.
    pub async fn send(
        &self,
        item: OutputItem,
    ) -> Result<(), mpsc::error::SendError<OutputItem>> {
        let records = item_records(&item);
        self.metrics.on_send(records);
        match self.inner.send(item).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.metrics.on_send_failed(records);
                Err(err)
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.max_capacity()
    }
}

#[derive(Debug)]
pub struct OutputReceiver {
    inner: mpsc::Receiver<OutputItem>,
    metrics: Arc<OutputQueueMetrics>,
}

impl OutputReceiver {
    pub async fn recv(&mut self) -> Option<OutputItem> {
        let item = self.inner.recv().await?;
        self.metrics.on_receive(item_records(&item));
        Some(item)
    }

    pub fn close(&mut self) {
        self.inner.close();
    }
}

pub struct OutputChannel;

impl OutputChannel {
    pub fn bounded(capacity: usize) -> (OutputSender, OutputReceiver, Arc<OutputQueueMetrics>) {
        let metrics = Arc::new(OutputQueueMetrics::default());
        let (tx, rx) = mpsc::channel(capacity);

        (
            OutputSender {
                inner: tx,
                metrics: Arc::clone(&metrics),
            },
            OutputReceiver {
                inner: rx,
                metrics: Arc::clone(&metrics),
            },
            metrics,
        )
    }
}
