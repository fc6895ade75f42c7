use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::core::batch::RowBatch;
use crate::engine::core::write::{TabletWriter, TabletWriterFactory};
use crate::engine::errors::WriterError;
use crate::engine::sink::SinkDescriptor;

/// What a mock transport saw, shared with the test.
#[derive(Debug, Default)]
pub struct TabletLog {
    pub batches: Mutex<Vec<RowBatch>>,
    pub opened: Mutex<bool>,
    pub closed: Mutex<bool>,
    pub cancelled: Mutex<Option<String>>,
}

impl TabletLog {
    pub fn batches(&self) -> Vec<RowBatch> {
        self.batches.lock().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn rows(&self) -> usize {
        self.batches.lock().iter().map(RowBatch::rows).sum()
    }

    pub fn is_opened(&self) -> bool {
        *self.opened.lock()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    pub fn cancel_reason(&self) -> Option<String> {
        self.cancelled.lock().clone()
    }
}

#[derive(Debug, Clone, Default)]
struct Behavior {
    fail_open: Option<String>,
    fail_write_at: Option<(usize, String)>,
    fail_close: Option<String>,
    write_delay: Option<Duration>,
    block_writes: bool,
    panic_on_write: bool,
}

struct MockTabletWriter {
    behavior: Behavior,
    log: Arc<TabletLog>,
    writes: usize,
}

#[async_trait]
impl TabletWriter for MockTabletWriter {
    async fn open(&mut self) -> Result<(), WriterError> {
        if let Some(msg) = &self.behavior.fail_open {
            return Err(WriterError::Open(msg.clone()));
        }
        *self.log.opened.lock() = true;
        Ok(())
    }

    async fn write(&mut self, batch: RowBatch) -> Result<(), WriterError> {
        let index = self.writes;
        self.writes += 1;

        if self.behavior.panic_on_write {
            panic!("mock transport panicked");
        }
        if self.behavior.block_writes {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.behavior.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((at, msg)) = &self.behavior.fail_write_at {
            if index == *at {
                return Err(WriterError::Write(msg.clone()));
            }
        }
        self.log.batches.lock().push(batch);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WriterError> {
        if let Some(msg) = &self.behavior.fail_close {
            return Err(WriterError::Close(msg.clone()));
        }
        *self.log.closed.lock() = true;
        Ok(())
    }

    async fn cancel(&mut self, reason: &str) {
        *self.log.cancelled.lock() = Some(reason.to_string());
    }
}

/// Builds a `TabletWriterFactory` whose transports record into one shared `TabletLog`.
pub struct MockTabletWriterFactory {
    behavior: Behavior,
    log: Arc<TabletLog>,
}

impl MockTabletWriterFactory {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::default(),
            log: Arc::new(TabletLog::default()),
        }
    }

    pub fn failing_open(mut self, msg: &str) -> Self {
        self.behavior.fail_open = Some(msg.to_string());
        self
    }

    /// The write with this 0-based index fails.
    pub fn failing_write_at(mut self, index: usize, msg: &str) -> Self {
        self.behavior.fail_write_at = Some((index, msg.to_string()));
        self
    }

    pub fn failing_close(mut self, msg: &str) -> Self {
        self.behavior.fail_close = Some(msg.to_string());
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.behavior.write_delay = Some(delay);
        self
    }

    /// Writes never complete; the queue fills and stays full.
    pub fn blocking(mut self) -> Self {
        self.behavior.block_writes = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior.panic_on_write = true;
        self
    }

    pub fn log(&self) -> Arc<TabletLog> {
        Arc::clone(&self.log)
    }

    /// A single transport, for driving `AsyncWriter` directly.
    pub fn writer(&self) -> Box<dyn TabletWriter> {
        Box::new(MockTabletWriter {
            behavior: self.behavior.clone(),
            log: Arc::clone(&self.log),
            writes: 0,
        })
    }

    pub fn build(self) -> (Arc<dyn TabletWriterFactory>, Arc<TabletLog>) {
        let log = self.log();
        (Arc::new(self), log)
    }
}

impl TabletWriterFactory for MockTabletWriterFactory {
    fn create(&self, _descriptor: &SinkDescriptor) -> Result<Box<dyn TabletWriter>, WriterError> {
        Ok(self.writer())
    }
}
