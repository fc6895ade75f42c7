use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the `AsyncWriter` handle and its background task.
#[derive(Debug, Default)]
pub struct WriterMetrics {
    submitted_batches: AtomicU64,
    submitted_rows: AtomicU64,
    written_batches: AtomicU64,
    written_rows: AtomicU64,
    rejected_submissions: AtomicU64,
    dropped_batches: AtomicU64,
    pending_batches: AtomicU64,
    peak_pending: AtomicU64,
}

impl WriterMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_submit(&self, rows: u64) {
        self.submitted_batches.fetch_add(1, Ordering::Relaxed);
        self.submitted_rows.fetch_add(rows, Ordering::Relaxed);
        self.pending_inc();
    }

    pub fn on_written(&self, rows: u64) {
        self.written_batches.fetch_add(1, Ordering::Relaxed);
        self.written_rows.fetch_add(rows, Ordering::Relaxed);
        self.pending_dec();
    }

    /// A queued batch that was discarded instead of written.
    pub fn on_dropped(&self) {
        self.dropped_batches.fetch_add(1, Ordering::Relaxed);
        self.pending_dec();
    }

    pub fn record_rejected(&self) {
        self.rejected_submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted_batches(&self) -> u64 {
        self.submitted_batches.load(Ordering::Relaxed)
    }

    pub fn submitted_rows(&self) -> u64 {
        self.submitted_rows.load(Ordering::Relaxed)
    }

    pub fn written_batches(&self) -> u64 {
        self.written_batches.load(Ordering::Relaxed)
    }

    pub fn written_rows(&self) -> u64 {
        self.written_rows.load(Ordering::Relaxed)
    }

    pub fn rejected_submissions(&self) -> u64 {
        self.rejected_submissions.load(Ordering::Relaxed)
    }

    pub fn dropped_batches(&self) -> u64 {
        self.dropped_batches.load(Ordering::Relaxed)
    }

    pub fn pending_batches(&self) -> u64 {
        self.pending_batches.load(Ordering::Relaxed)
    }

    pub fn peak_pending_batches(&self) -> u64 {
        self.peak_pending.load(Ordering::Relaxed)
    }

    fn pending_inc(&self) {
        let pending = self.pending_batches.fetch_add(1, Ordering::Relaxed) + 1;
        loop {
            let current_peak = self.peak_pending.load(Ordering::Relaxed);
            if pending <= current_peak {
                break;
            }
            if self
                .peak_pending
                .compare_exchange(current_peak, pending, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    fn pending_dec(&self) {
        let _ = self
            .pending_batches
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| p.checked_sub(1));
    }
}
