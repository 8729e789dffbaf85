use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::engine::errors::AggregateFetchError;
use crate::shared::path::absolutize;

use super::super::batch::{BatchProcessor, BatchRegistry, ProcessedBatchInfo};
use super::super::config::AggregateFetchConfig;
use super::super::container::RecordBatchContainer;
use super::super::merge::{IntermediaryMergeSort, NonSortingMerge, SortingMerge};
use super::super::ordering::MergeStrategy;
use super::super::output::{
    ChangesOnlyFilter, ChannelStreamFilter, OutputChannel, OutputConsumer, OutputController,
    OutputItem, OutputQueueMetrics, OutputReceiver, OutputSender,
};
use super::super::query::{QueryStreamProcessor, RecordCursor};
use super::super::record;
use super::ids::BatchIdAllocator;
use super::state::{CoordinatorState, StateCell};

const LOG_TARGET: &str = "chanfetch::coordinator";
const LIVENESS_POLL: Duration = Duration::from_millis(10);
const COLLECTION_POLL: Duration = Duration::from_millis(2);

/// Terminal accounting for one successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    /// Records delivered to the sink, after stream filters.
    pub records_delivered: u64,
    /// Raw batches processed and registered.
    pub batches_processed: u64,
    /// Intermediary merges that ran during reduction rounds.
    pub intermediary_merges: usize,
}

/// Orchestrates one aggregate fetch end to end: owns the batch registry, the
/// batch id allocator, the output queue, the temp directory, and the
/// cooperative shutdown signal every worker observes. The fetch fails
/// atomically; the caller either gets a complete ordered result or an error
/// with cleaned-up temp state.
#[derive(Debug)]
pub struct AggregateQueryCoordinator {
    config: Arc<AggregateFetchConfig>,
    strategy: MergeStrategy,
    run_id: String,
    temp_dir: PathBuf,
    registry: BatchRegistry,
    ids: Arc<BatchIdAllocator>,
    state: StateCell,
    output_tx: OutputSender,
    output_rx: Mutex<Option<OutputReceiver>>,
    output_metrics: Arc<OutputQueueMetrics>,
    shutdown_tx: watch::Sender<bool>,
    collection_complete: AtomicBool,
    workers_alive: AtomicUsize,
    batches_processed: AtomicU64,
    intermediary_in_flight: AtomicUsize,
    intermediary_merges: AtomicUsize,
    failure: Mutex<Option<AggregateFetchError>>,
}

impl AggregateQueryCoordinator {
    /// Validates the configuration eagerly and builds the coordinator. No
    /// worker starts until [`run`](Self::run) is called.
    pub fn new(config: AggregateFetchConfig) -> Result<Arc<Self>, AggregateFetchError> {
        config.validate()?;
        let strategy = config.ordering.merge_strategy();
        let run_id = generate_run_id();
        let temp_dir = absolutize(&config.chunk_dir).join(&run_id);
        let (output_tx, output_rx, output_metrics) =
            OutputChannel::bounded(config.output_queue_size);
        let (shutdown_tx, _) = watch::channel(false);

        info!(
            target: LOG_TARGET,
            run_id = %run_id,
            strategy = ?strategy,
            "Coordinator constructed"
        );
        Ok(Arc::new(Self {
            config: Arc::new(config),
            strategy,
            run_id,
            temp_dir,
            registry: BatchRegistry::new(),
            ids: Arc::new(BatchIdAllocator::new()),
            state: StateCell::new(),
            output_tx,
            output_rx: Mutex::new(Some(output_rx)),
            output_metrics,
            shutdown_tx,
            collection_complete: AtomicBool::new(false),
            workers_alive: AtomicUsize::new(0),
            batches_processed: AtomicU64::new(0),
            intermediary_in_flight: AtomicUsize::new(0),
            intermediary_merges: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }))
    }

    // ---- registry access ----

    pub fn add_batch_to_cache_map(&self, batch_id: String, info: ProcessedBatchInfo) {
        debug!(
            target: LOG_TARGET,
            batch_id = %batch_id,
            records = info.record_count(),
            spilled = info.is_spilled(),
            "Registering processed batch"
        );
        self.registry.insert(batch_id, info);
    }

    pub fn get_batch(&self, batch_id: &str) -> Option<Arc<ProcessedBatchInfo>> {
        self.registry.get(batch_id)
    }

    pub fn remove_batch(&self, batch_id: &str) -> Option<Arc<ProcessedBatchInfo>> {
        self.registry.remove(batch_id)
    }

    /// Point-in-time snapshot of the registry.
    pub fn cache_map_snapshot(&self) -> Vec<(String, Arc<ProcessedBatchInfo>)> {
        self.registry.snapshot()
    }

    /// Registered batch ids in arrival order.
    pub fn sorted_batch_ids(&self) -> Vec<String> {
        self.registry.sorted_batch_ids()
    }

    pub fn batch_count(&self) -> usize {
        self.registry.len()
    }

    // ---- batch ids ----

    pub fn id_allocator(&self) -> Arc<BatchIdAllocator> {
        Arc::clone(&self.ids)
    }

    pub fn next_batch_id(&self) -> String {
        self.ids.next_batch_id()
    }

    pub fn next_merged_id(&self) -> String {
        self.ids.next_merged_id()
    }

    pub fn pending_head(&self) -> Option<String> {
        self.ids.pending_head()
    }

    pub fn pop_pending(&self) -> Option<String> {
        self.ids.pop_pending()
    }

    pub fn pending_is_empty(&self) -> bool {
        self.ids.pending_is_empty()
    }

    // ---- liveness and readiness ----

    pub fn collection_complete(&self) -> bool {
        self.collection_complete.load(Ordering::SeqCst)
    }

    /// True while any spawned stage is still running.
    pub fn threads_alive(&self) -> bool {
        self.workers_alive.load(Ordering::SeqCst) > 0
    }

    pub fn data_is_being_processed(&self) -> bool {
        !self.collection_complete() || !self.registry.is_empty() || self.output_metrics.depth() > 0
    }

    /// Reduction rounds are warranted once collection is over and the
    /// registry holds more batches than the fan-in threshold.
    pub fn ready_for_intermediate_merge(&self) -> bool {
        self.collection_complete() && self.registry.len() > self.config.batch_temp_file_threshold
    }

    /// The final merge may run once no more batches can arrive, no reduction
    /// merge is in flight, and the registry fits a single pass.
    pub fn batch_files_ready_for_final_merge(&self) -> bool {
        self.collection_complete()
            && self.intermediary_in_flight.load(Ordering::SeqCst) == 0
            && self.registry.len() <= self.config.final_merge_batch_boundary
    }

    // ---- output queue ----

    /// Bounded enqueue to the output controller. Blocks the calling merge
    /// task while the queue is full; exits early when shutdown is requested.
    pub async fn push_batch_to_output_controller(
        &self,
        records: Vec<String>,
    ) -> Result<(), AggregateFetchError> {
        self.push_output_item(OutputItem::Batch(records)).await
    }

    async fn push_output_item(&self, item: OutputItem) -> Result<(), AggregateFetchError> {
        let mut shutdown = self.subscribe_shutdown();
        if self.is_shutdown_requested() {
            return Err(AggregateFetchError::ShutdownRequested);
        }
        tokio::select! {
            res = self.output_tx.send(item) => {
                res.map_err(|_| AggregateFetchError::QueueClosed("output record queue"))
            }
            _ = shutdown.changed() => Err(AggregateFetchError::ShutdownRequested),
        }
    }

    pub fn output_queue_depth(&self) -> usize {
        self.output_metrics.depth()
    }

    // ---- shutdown ----

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Signals every worker to stop without waiting. Workers that hit a
    /// fatal error call this through [`fail`](Self::fail);
    /// [`initiate_shutdown`](Self::initiate_shutdown) adds the bounded wait
    /// and temp cleanup.
    fn request_shutdown(&self) {
        self.state.advance(CoordinatorState::Shutdown);
        let _ = self.shutdown_tx.send(true);
    }

    /// Records the first fatal error and requests shutdown. Later errors are
    /// dropped; the first one is what the caller sees.
    fn fail(&self, error: AggregateFetchError) {
        {
            let mut slot = self.failure.lock();
            if slot.is_none() {
                *slot = Some(error);
            }
        }
        self.request_shutdown();
    }

    fn has_failed(&self) -> bool {
        self.failure.lock().is_some()
    }

    fn take_failure(&self) -> Option<AggregateFetchError> {
        self.failure.lock().take()
    }

    /// Cooperative full stop: signals shutdown, waits (bounded) for workers
    /// to exit, and removes the run's temp files. Idempotent.
    pub async fn initiate_shutdown(&self) {
        self.request_shutdown();
        let deadline = Duration::from_millis(self.config.shutdown_wait_ms);
        let start = Instant::now();
        while self.threads_alive() && start.elapsed() < deadline {
            sleep(LIVENESS_POLL).await;
        }
        if self.threads_alive() {
            warn!(
                target: LOG_TARGET,
                "Workers still alive after shutdown wait; cleaning up anyway"
            );
        }
        self.clean_up_temp_files();
    }

    /// Deletes the run's temp directory and drops any batches still
    /// registered. Idempotent; a second call finds nothing to remove.
    pub fn clean_up_temp_files(&self) {
        if self.config.keep_temp_files {
            debug!(
                target: LOG_TARGET,
                temp_dir = %self.temp_dir.display(),
                "Keeping temp files"
            );
            return;
        }
        for (_, info) in self.registry.drain() {
            info.delete_backing_files();
        }
        match fs::remove_dir_all(&self.temp_dir) {
            Ok(()) => {
                debug!(target: LOG_TARGET, temp_dir = %self.temp_dir.display(), "Removed temp directory")
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    temp_dir = %self.temp_dir.display(),
                    error = %e,
                    "Failed to remove temp directory"
                )
            }
        }
    }

    // ---- intermediary merge accounting ----

    pub fn intermediary_merge_started(&self) {
        self.intermediary_in_flight.fetch_add(1, Ordering::SeqCst);
    }

    pub fn intermediary_merge_aborted(&self) {
        self.intermediary_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Swaps a merged group out of the registry: consumed batches are removed
    /// and their files deleted, the merged batch takes their place.
    pub fn complete_intermediary_merge(
        &self,
        consumed: &[(String, Arc<ProcessedBatchInfo>)],
        merged_id: String,
        merged: ProcessedBatchInfo,
    ) {
        for (id, info) in consumed {
            self.registry.remove(id);
            info.delete_backing_files();
        }
        self.registry.insert(merged_id, merged);
        self.intermediary_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.intermediary_merges.fetch_add(1, Ordering::SeqCst);
    }

    pub fn intermediary_merge_count(&self) -> usize {
        self.intermediary_merges.load(Ordering::SeqCst)
    }

    // ---- misc accessors ----

    pub fn config(&self) -> &AggregateFetchConfig {
        &self.config
    }

    pub fn temp_dir(&self) -> &PathBuf {
        &self.temp_dir
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.get()
    }

    pub fn advance_state(&self, next: CoordinatorState) {
        self.state.advance(next);
    }

    fn note_batch_processed(&self) {
        self.batches_processed.fetch_add(1, Ordering::SeqCst);
    }

    // ---- the run itself ----

    /// Runs the whole fetch to completion: spawns every stage, drains the
    /// output, and shuts down. Fails atomically: on error the sink has no
    /// complete result and temp state is cleaned up.
    pub async fn run(
        self: &Arc<Self>,
        cursor: Box<dyn RecordCursor>,
        consumer: Box<dyn OutputConsumer>,
    ) -> Result<FetchSummary, AggregateFetchError> {
        self.run_with_filters(cursor, consumer, Vec::new()).await
    }

    /// Like [`run`](Self::run), with additional stream filters applied after
    /// the configured ones.
    pub async fn run_with_filters(
        self: &Arc<Self>,
        cursor: Box<dyn RecordCursor>,
        consumer: Box<dyn OutputConsumer>,
        mut filters: Vec<Box<dyn ChannelStreamFilter>>,
    ) -> Result<FetchSummary, AggregateFetchError> {
        if self.config.changes_only {
            filters.insert(0, Box::new(ChangesOnlyFilter::new()));
        }
        let result = self.execute(cursor, consumer, filters).await;
        self.initiate_shutdown().await;
        result
    }

    async fn execute(
        self: &Arc<Self>,
        cursor: Box<dyn RecordCursor>,
        consumer: Box<dyn OutputConsumer>,
        filters: Vec<Box<dyn ChannelStreamFilter>>,
    ) -> Result<FetchSummary, AggregateFetchError> {
        fs::create_dir_all(&self.temp_dir)?;
        info!(
            target: LOG_TARGET,
            run_id = %self.run_id,
            temp_dir = %self.temp_dir.display(),
            "Aggregate fetch starting"
        );

        let output_rx = self
            .output_rx
            .lock()
            .take()
            .ok_or(AggregateFetchError::QueueClosed("output record queue"))?;
        let controller =
            OutputController::new(output_rx, consumer, filters, self.subscribe_shutdown());
        let output_handle = self.spawn_worker("output-controller", controller.run());

        self.push_header_rows().await?;

        // Batch processor pool draining one bounded queue; the bound is the
        // backpressure path to the query cursor.
        let (batch_tx, batch_rx) =
            mpsc::channel::<RecordBatchContainer>(self.config.processor_queue_size);
        let batch_rx = Arc::new(tokio::sync::Mutex::new(batch_rx));
        let mut processor_handles = Vec::with_capacity(self.config.parallel_threads);
        for worker_id in 0..self.config.parallel_threads {
            let processor =
                BatchProcessor::new(worker_id, Arc::clone(&self.config), self.temp_dir.clone());
            let rx = Arc::clone(&batch_rx);
            let coordinator = Arc::clone(self);
            processor_handles.push(self.spawn_worker(
                "batch-processor",
                async move { processor_loop(coordinator, processor, rx).await },
            ));
        }

        // Merge stage, fixed once from the ordering configuration.
        let merge_handle = match self.strategy {
            MergeStrategy::Concatenate => {
                let merge = NonSortingMerge::new(Arc::clone(self));
                self.spawn_worker("non-sorting-merge", merge.run())
            }
            MergeStrategy::KWay => {
                let coordinator = Arc::clone(self);
                self.spawn_worker("sorting-merge", async move {
                    sorted_merge_pipeline(coordinator).await
                })
            }
        };

        // The stream task owns the only queue sender, so the processor pool
        // drains and exits when the stream finishes.
        let stream = QueryStreamProcessor::new(cursor, self.config.chunk_size);
        let stream_handle = self.spawn_worker(
            "query-stream",
            stream.run(Arc::clone(&self.ids), batch_tx, self.subscribe_shutdown()),
        );

        self.join_stage(stream_handle).await;
        for handle in processor_handles {
            self.join_stage(handle).await;
        }
        self.collection_complete.store(true, Ordering::SeqCst);
        debug!(
            target: LOG_TARGET,
            batches = self.registry.len(),
            "Collection complete"
        );

        self.join_stage(merge_handle).await;

        if !self.has_failed() {
            if let Err(error) = self.finish_stream().await {
                match error {
                    AggregateFetchError::ShutdownRequested => {}
                    error => self.fail(error),
                }
            }
        }

        let delivered = match output_handle.await {
            Ok(Ok(count)) => count,
            Ok(Err(_)) => 0,
            Err(e) => {
                self.fail(AggregateFetchError::WorkerPanic(e.to_string()));
                0
            }
        };

        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        info!(
            target: LOG_TARGET,
            records_delivered = delivered,
            "Aggregate fetch complete"
        );
        Ok(FetchSummary {
            records_delivered: delivered,
            batches_processed: self.batches_processed.load(Ordering::SeqCst),
            intermediary_merges: self.intermediary_merge_count(),
        })
    }

    /// Header rows go out before any merged record: the template header when
    /// templating, otherwise the CSV column header when asked for.
    async fn push_header_rows(&self) -> Result<(), AggregateFetchError> {
        let mut rows = Vec::new();
        match &self.config.template {
            Some(template) => {
                if let Some(header) = &template.header {
                    rows.push(header.clone());
                }
            }
            None => {
                if self.config.show_column_header {
                    rows.push(record::csv_header());
                }
            }
        }
        if !rows.is_empty() {
            self.push_batch_to_output_controller(rows).await?;
        }
        Ok(())
    }

    /// Trailer plus the explicit end-of-stream signal, after a clean merge.
    async fn finish_stream(&self) -> Result<(), AggregateFetchError> {
        if let Some(trailer) = self.config.template.as_ref().and_then(|t| t.trailer.clone()) {
            self.push_batch_to_output_controller(vec![trailer]).await?;
        }
        self.advance_state(CoordinatorState::Draining);
        self.push_output_item(OutputItem::End).await
    }

    /// Spawns a stage task, tracking liveness and funnelling its error (if
    /// any) into the failure slot so every other stage gets cancelled.
    fn spawn_worker<T>(
        self: &Arc<Self>,
        name: &'static str,
        fut: impl Future<Output = Result<T, AggregateFetchError>> + Send + 'static,
    ) -> JoinHandle<Result<T, AggregateFetchError>>
    where
        T: Send + 'static,
    {
        let coordinator = Arc::clone(self);
        coordinator.workers_alive.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let result = fut.await;
            coordinator.workers_alive.fetch_sub(1, Ordering::SeqCst);
            match result {
                Ok(value) => Ok(value),
                Err(AggregateFetchError::ShutdownRequested) => {
                    debug!(target: LOG_TARGET, worker = name, "Worker exited on shutdown");
                    Err(AggregateFetchError::ShutdownRequested)
                }
                Err(error) => {
                    error!(target: LOG_TARGET, worker = name, error = %error, "Worker failed");
                    coordinator.fail(error);
                    Err(AggregateFetchError::ShutdownRequested)
                }
            }
        })
    }

    /// Awaits a stage; worker errors are already in the failure slot, so
    /// only panics need recording here.
    async fn join_stage<T>(&self, handle: JoinHandle<Result<T, AggregateFetchError>>) {
        if let Err(e) = handle.await {
            self.fail(AggregateFetchError::WorkerPanic(e.to_string()));
        }
    }
}

/// One batch processor worker: pulls raw batches from the shared queue,
/// processes them, and registers the result.
async fn processor_loop(
    coordinator: Arc<AggregateQueryCoordinator>,
    processor: BatchProcessor,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<RecordBatchContainer>>>,
) -> Result<(), AggregateFetchError> {
    let mut shutdown = coordinator.subscribe_shutdown();
    loop {
        if coordinator.is_shutdown_requested() {
            return Ok(());
        }
        let container = {
            let mut guard = rx.lock().await;
            tokio::select! {
                container = guard.recv() => container,
                _ = shutdown.changed() => return Ok(()),
            }
        };
        let Some(container) = container else {
            return Ok(());
        };
        let batch_id = container.batch_id.clone();
        let info = processor.process(container)?;
        coordinator.add_batch_to_cache_map(batch_id, info);
        coordinator.note_batch_processed();
    }
}

/// The sorted-path merge stage: waits for collection to finish, runs
/// reduction rounds when the registry is over the fan-in threshold, then the
/// single final merge pass.
async fn sorted_merge_pipeline(
    coordinator: Arc<AggregateQueryCoordinator>,
) -> Result<(), AggregateFetchError> {
    let mut shutdown = coordinator.subscribe_shutdown();
    while !coordinator.collection_complete() {
        if coordinator.is_shutdown_requested() {
            return Ok(());
        }
        tokio::select! {
            _ = sleep(COLLECTION_POLL) => {}
            _ = shutdown.changed() => return Ok(()),
        }
    }

    if coordinator.ready_for_intermediate_merge() {
        coordinator.advance_state(CoordinatorState::MergingIntermediate);
        IntermediaryMergeSort::new(Arc::clone(&coordinator))
            .run()
            .await?;
    }

    coordinator.advance_state(CoordinatorState::MergingFinal);
    SortingMerge::new(Arc::clone(&coordinator)).run().await?;
    Ok(())
}

fn generate_run_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("run-{}-{}", std::process::id(), nanos)
}
