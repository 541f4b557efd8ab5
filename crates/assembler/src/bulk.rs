//! Batching, retrying write path into the document store.
//!
//! Finished instances are buffered on a worker thread and flushed as one
//! bulk request when the buffered action count or byte size crosses its
//! threshold, or when the flush interval elapses, whichever comes first.
//! Failed batches are retried with exponential backoff; a batch that
//! exhausts its attempts is reported and dropped, never surfaced to the
//! caller. `close` drains everything and joins the worker.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use caselog_core::{Error, LogInstance, Result};
use caselog_store::{DocumentStore, StoredDocument};
use tracing::{debug, warn};

/// Policy knobs for the bulk write path.
#[derive(Debug, Clone)]
pub struct BulkWriterConfig {
    /// Flush when this many documents are buffered
    pub max_actions: usize,
    /// Flush when the buffered documents reach this many encoded bytes
    pub max_bytes: usize,
    /// Flush whatever is buffered after this long without a threshold flush
    pub flush_interval: Duration,
    /// Upper bound on concurrently in-flight batches
    pub max_concurrent: usize,
    /// Write attempts per batch, first try included, before the batch is
    /// reported as failed and dropped
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each subsequent retry
    pub backoff_base: Duration,
}

impl Default for BulkWriterConfig {
    fn default() -> Self {
        BulkWriterConfig {
            max_actions: 10_000,
            max_bytes: 1 << 30,
            flush_interval: Duration::from_secs(5),
            max_concurrent: 1,
            max_attempts: 3,
            backoff_base: Duration::from_millis(100),
        }
    }
}

/// Batching writer of finished instances.
///
/// `add` hands the instance to a worker thread and returns immediately;
/// callers only block in [`BulkWriter::close`], which waits for all buffered
/// and in-flight batches to complete.
pub struct BulkWriter {
    tx: Option<mpsc::Sender<(StoredDocument, usize)>>,
    worker: Option<JoinHandle<()>>,
}

impl BulkWriter {
    /// Create a writer flushing into `store`.
    pub fn new(store: Arc<dyn DocumentStore>, config: BulkWriterConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || run_worker(store, config, rx));
        BulkWriter {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Buffer one finished instance for writing.
    pub fn add(&self, instance: &LogInstance) -> Result<()> {
        let body = serde_json::to_value(instance)?;
        let bytes = body.to_string().len();
        let doc = StoredDocument::new(instance.case_id.clone(), body);
        self.tx
            .as_ref()
            .ok_or_else(|| Error::Closed("bulk writer already closed".into()))?
            .send((doc, bytes))
            .map_err(|_| Error::Closed("bulk writer worker stopped".into()))
    }

    /// Flush the remainder and block until every batch has completed.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for BulkWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    store: Arc<dyn DocumentStore>,
    config: BulkWriterConfig,
    rx: Receiver<(StoredDocument, usize)>,
) {
    let mut buffer: Vec<StoredDocument> = Vec::new();
    let mut buffered_bytes = 0usize;
    let mut in_flight: VecDeque<JoinHandle<()>> = VecDeque::new();
    let mut batch_seq = 0u64;
    let mut deadline = Instant::now() + config.flush_interval;

    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok((doc, bytes)) => {
                buffer.push(doc);
                buffered_bytes += bytes;
                if buffer.len() >= config.max_actions || buffered_bytes >= config.max_bytes {
                    dispatch(
                        &store,
                        &config,
                        &mut buffer,
                        &mut buffered_bytes,
                        &mut batch_seq,
                        &mut in_flight,
                    );
                    deadline = Instant::now() + config.flush_interval;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !buffer.is_empty() {
                    dispatch(
                        &store,
                        &config,
                        &mut buffer,
                        &mut buffered_bytes,
                        &mut batch_seq,
                        &mut in_flight,
                    );
                }
                deadline = Instant::now() + config.flush_interval;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if !buffer.is_empty() {
        dispatch(
            &store,
            &config,
            &mut buffer,
            &mut buffered_bytes,
            &mut batch_seq,
            &mut in_flight,
        );
    }
    for handle in in_flight {
        let _ = handle.join();
    }
}

fn dispatch(
    store: &Arc<dyn DocumentStore>,
    config: &BulkWriterConfig,
    buffer: &mut Vec<StoredDocument>,
    buffered_bytes: &mut usize,
    batch_seq: &mut u64,
    in_flight: &mut VecDeque<JoinHandle<()>>,
) {
    while in_flight.len() >= config.max_concurrent.max(1) {
        if let Some(handle) = in_flight.pop_front() {
            let _ = handle.join();
        }
    }

    let batch = std::mem::take(buffer);
    *buffered_bytes = 0;
    *batch_seq += 1;
    let seq = *batch_seq;
    debug!(batch = seq, actions = batch.len(), "dispatching bulk batch");

    let store = Arc::clone(store);
    let max_attempts = config.max_attempts;
    let backoff_base = config.backoff_base;
    in_flight.push_back(thread::spawn(move || {
        write_with_retry(store.as_ref(), seq, &batch, max_attempts, backoff_base);
    }));
}

fn write_with_retry(
    store: &dyn DocumentStore,
    seq: u64,
    batch: &[StoredDocument],
    max_attempts: u32,
    backoff_base: Duration,
) {
    let mut delay = backoff_base;
    for attempt in 1..=max_attempts.max(1) {
        match store.bulk_write(batch) {
            Ok(()) => {
                debug!(batch = seq, actions = batch.len(), attempt, "bulk batch written");
                return;
            }
            Err(e) if attempt < max_attempts => {
                debug!(batch = seq, attempt, error = %e, "bulk write failed, backing off");
                thread::sleep(delay);
                delay *= 2;
            }
            Err(e) => {
                warn!(
                    batch = seq,
                    actions = batch.len(),
                    error = %e,
                    "bulk batch dropped after {attempt} attempts"
                );
            }
        }
    }
}
