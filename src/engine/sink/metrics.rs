use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters and timers of one table sink. Timers are in nanoseconds.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    input_rows: AtomicU64,
    input_batches: AtomicU64,
    empty_batches: AtomicU64,
    projected_rows: AtomicU64,
    backpressure_events: AtomicU64,
    open_time_ns: AtomicU64,
    exec_time_ns: AtomicU64,
    close_time_ns: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_input(&self, rows: u64) {
        self.input_batches.fetch_add(1, Ordering::Relaxed);
        self.input_rows.fetch_add(rows, Ordering::Relaxed);
        if rows == 0 {
            self.empty_batches.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn on_projected(&self, rows: u64) {
        self.projected_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_open_time(&self, elapsed: Duration) {
        self.open_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn add_exec_time(&self, elapsed: Duration) {
        self.exec_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn add_close_time(&self, elapsed: Duration) {
        self.close_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn input_rows(&self) -> u64 {
        self.input_rows.load(Ordering::Relaxed)
    }

    pub fn input_batches(&self) -> u64 {
        self.input_batches.load(Ordering::Relaxed)
    }

    pub fn empty_batches(&self) -> u64 {
        self.empty_batches.load(Ordering::Relaxed)
    }

    pub fn projected_rows(&self) -> u64 {
        self.projected_rows.load(Ordering::Relaxed)
    }

    pub fn backpressure_events(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }

    pub fn open_time_ns(&self) -> u64 {
        self.open_time_ns.load(Ordering::Relaxed)
    }

    pub fn exec_time_ns(&self) -> u64 {
        self.exec_time_ns.load(Ordering::Relaxed)
    }

    pub fn close_time_ns(&self) -> u64 {
        self.close_time_ns.load(Ordering::Relaxed)
    }
}
