use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::core::batch::RowBatch;
use crate::engine::errors::{SinkError, WriterError};
use crate::shared::config::CONFIG;

use super::metrics::WriterMetrics;
use super::tablet_writer::TabletWriter;

#[derive(Debug, Clone)]
pub struct AsyncWriterOptions {
    pub queue_capacity: usize,
    pub write_timeout_ms: u64,
}

impl AsyncWriterOptions {
    pub fn from_config() -> Self {
        Self {
            queue_capacity: CONFIG.writer.queue_capacity,
            write_timeout_ms: CONFIG.writer.write_timeout_ms,
        }
    }
}

impl Default for AsyncWriterOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            write_timeout_ms: 30_000,
        }
    }
}

/// Outcome of a non-blocking submission. A rejected batch is handed back untouched.
#[derive(Debug)]
pub enum Submitted {
    Accepted,
    Rejected(RowBatch),
}

impl Submitted {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submitted::Accepted)
    }
}

/// State shared by the handle and the background task.
#[derive(Debug, Default)]
struct WriterShared {
    first_error: Mutex<Option<WriterError>>,
    cancel_reason: Mutex<Option<String>>,
    cancelled: AtomicBool,
    cancel_notify: Notify,
}

impl WriterShared {
    fn record_error(&self, err: &WriterError) {
        let mut first = self.first_error.lock();
        if first.is_none() {
            *first = Some(err.clone());
        }
    }

    fn first_error(&self) -> Option<WriterError> {
        self.first_error.lock().clone()
    }

    fn cancel(&self, reason: String) {
        self.cancel_reason.lock().get_or_insert(reason);
        self.cancelled.store(true, Ordering::Release);
        self.cancel_notify.notify_one();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel_reason(&self) -> String {
        self.cancel_reason
            .lock()
            .clone()
            .unwrap_or_else(|| "cancelled".to_string())
    }
}

/// Moves row batches to a `TabletWriter` on a background tokio task through a bounded queue.
///
/// Submission never blocks: a full queue hands the batch back. Batches reach the transport in
/// submission order. `drain_and_close` is the single barrier that waits for the task.
pub struct AsyncWriter {
    label: String,
    sender: Option<Sender<RowBatch>>,
    worker: Option<JoinHandle<Result<(), WriterError>>>,
    shared: Arc<WriterShared>,
    metrics: Arc<WriterMetrics>,
    close_status: Option<Result<(), WriterError>>,
}

impl AsyncWriter {
    /// Opens the transport and starts the background task. An open failure is returned here,
    /// before any batch is accepted.
    pub async fn open(
        label: &str,
        mut transport: Box<dyn TabletWriter>,
        options: AsyncWriterOptions,
    ) -> Result<Self, WriterError> {
        if let Err(e) = transport.open().await {
            error!(target: "olap_ingest::async_writer::open", label, error = %e, "Failed to open tablet writer");
            return Err(e);
        }

        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let shared = Arc::new(WriterShared::default());
        let metrics = WriterMetrics::new();

        let worker = WriterWorker {
            label: label.to_string(),
            transport,
            shared: Arc::clone(&shared),
            metrics: Arc::clone(&metrics),
            write_timeout_ms: options.write_timeout_ms,
        };
        let handle = tokio::spawn(worker.run(rx));

        info!(
            target: "olap_ingest::async_writer::open",
            label, queue_capacity = options.queue_capacity, write_timeout_ms = options.write_timeout_ms,
            "Async writer started"
        );

        Ok(Self {
            label: label.to_string(),
            sender: Some(tx),
            worker: Some(handle),
            shared,
            metrics,
            close_status: None,
        })
    }

    /// Enqueues `batch` without waiting. Fails once the writer has failed or been closed.
    pub fn submit(&self, batch: RowBatch) -> Result<Submitted, WriterError> {
        if let Some(e) = self.shared.first_error() {
            return Err(e);
        }
        let sender = self.sender.as_ref().ok_or(WriterError::Closed)?;

        match sender.try_reserve() {
            Ok(permit) => {
                self.metrics.on_submit(batch.rows() as u64);
                permit.send(batch);
                Ok(Submitted::Accepted)
            }
            Err(TrySendError::Full(())) => {
                self.metrics.record_rejected();
                debug!(target: "olap_ingest::async_writer::submit", label = %self.label, rows = batch.rows(), "Writer queue full, batch rejected");
                Ok(Submitted::Rejected(batch))
            }
            Err(TrySendError::Closed(())) => {
                Err(self.shared.first_error().unwrap_or(WriterError::Closed))
            }
        }
    }

    /// Waits for queue space. Only used while shutting down a load.
    pub async fn submit_blocking(&self, batch: RowBatch) -> Result<(), WriterError> {
        if let Some(e) = self.shared.first_error() {
            return Err(e);
        }
        let sender = self.sender.as_ref().ok_or(WriterError::Closed)?;

        let permit = sender
            .reserve()
            .await
            .map_err(|_| self.shared.first_error().unwrap_or(WriterError::Closed))?;
        self.metrics.on_submit(batch.rows() as u64);
        permit.send(batch);
        Ok(())
    }

    /// True when a `submit` right now would be accepted.
    pub fn can_write(&self) -> bool {
        self.shared.first_error().is_none()
            && self
                .sender
                .as_ref()
                .map(|s| s.capacity() > 0)
                .unwrap_or(false)
    }

    pub fn first_error(&self) -> Option<WriterError> {
        self.shared.first_error()
    }

    pub fn metrics(&self) -> Arc<WriterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Closes the queue and waits for the background task. With a failing `exec_status` the
    /// remaining queued batches are dropped and the transport is cancelled instead of closed.
    /// The first result is kept and returned by every later call.
    pub async fn drain_and_close(
        &mut self,
        exec_status: &Result<(), SinkError>,
    ) -> Result<(), WriterError> {
        if let Some(status) = &self.close_status {
            return status.clone();
        }

        if let Err(e) = exec_status {
            self.shared.cancel(e.to_string());
        }
        self.sender.take();

        let worker_status = match self.worker.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    error!(
                        target: "olap_ingest::async_writer::drain_and_close",
                        label = %self.label, error = %join_err,
                        "Writer task panicked"
                    );
                    let err = WriterError::Panicked(join_err.to_string());
                    self.shared.record_error(&err);
                    Err(err)
                }
            },
            None => Ok(()),
        };

        let status = match self.shared.first_error() {
            Some(e) => Err(e),
            None => worker_status,
        };

        match &status {
            Ok(()) => info!(
                target: "olap_ingest::async_writer::drain_and_close",
                label = %self.label,
                batches = self.metrics.written_batches(),
                rows = self.metrics.written_rows(),
                "Async writer drained"
            ),
            Err(e) => warn!(
                target: "olap_ingest::async_writer::drain_and_close",
                label = %self.label, error = %e,
                dropped = self.metrics.dropped_batches(),
                "Async writer closed with error"
            ),
        }

        self.close_status = Some(status.clone());
        status
    }
}

impl Drop for AsyncWriter {
    fn drop(&mut self) {
        if self.close_status.is_none() {
            self.shared.cancel("writer dropped before close".to_string());
        }
    }
}

struct WriterWorker {
    label: String,
    transport: Box<dyn TabletWriter>,
    shared: Arc<WriterShared>,
    metrics: Arc<WriterMetrics>,
    write_timeout_ms: u64,
}

impl WriterWorker {
    async fn run(mut self, mut rx: Receiver<RowBatch>) -> Result<(), WriterError> {
        while let Some(batch) = self.next_batch(&mut rx).await {
            let rows = batch.rows() as u64;
            match self.write_one(batch).await {
                Ok(()) => self.metrics.on_written(rows),
                Err(e) => {
                    self.metrics.on_dropped();
                    return self.abort(e, &mut rx).await;
                }
            }
        }

        if self.shared.is_cancelled() {
            let reason = self.shared.cancel_reason();
            return self.abort(WriterError::Cancelled(reason), &mut rx).await;
        }

        if let Err(e) = self.transport.close().await {
            self.shared.record_error(&e);
            error!(target: "olap_ingest::async_writer::run", label = %self.label, error = %e, "Tablet writer close failed");
            return Err(e);
        }
        debug!(target: "olap_ingest::async_writer::run", label = %self.label, "Writer task exited normally");
        Ok(())
    }

    async fn next_batch(&mut self, rx: &mut Receiver<RowBatch>) -> Option<RowBatch> {
        if self.shared.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shared.cancel_notify.notified() => None,
            next = rx.recv() => next,
        }
    }

    async fn write_one(&mut self, batch: RowBatch) -> Result<(), WriterError> {
        let timeout = Duration::from_millis(self.write_timeout_ms);
        let outcome = tokio::select! {
            biased;
            _ = self.shared.cancel_notify.notified() => None,
            result = tokio::time::timeout(timeout, self.transport.write(batch)) => Some(result),
        };

        match outcome {
            None => Err(WriterError::Cancelled(self.shared.cancel_reason())),
            Some(Ok(result)) => result,
            Some(Err(_elapsed)) => Err(WriterError::Timeout(self.write_timeout_ms)),
        }
    }

    async fn abort(
        &mut self,
        err: WriterError,
        rx: &mut Receiver<RowBatch>,
    ) -> Result<(), WriterError> {
        self.shared.record_error(&err);
        warn!(target: "olap_ingest::async_writer::run", label = %self.label, error = %err, "Aborting tablet load");

        rx.close();
        while rx.try_recv().is_ok() {
            self.metrics.on_dropped();
        }
        self.transport.cancel(&err.to_string()).await;

        Err(self.shared.first_error().unwrap_or(err))
    }
}
