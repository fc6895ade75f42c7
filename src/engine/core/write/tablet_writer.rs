use async_trait::async_trait;

use crate::engine::core::batch::RowBatch;
use crate::engine::errors::WriterError;
use crate::engine::sink::SinkDescriptor;

/// Transport that moves row batches into table storage. Driven by a single background task,
/// so calls never overlap.
#[async_trait]
pub trait TabletWriter: Send {
    async fn open(&mut self) -> Result<(), WriterError>;

    async fn write(&mut self, batch: RowBatch) -> Result<(), WriterError>;

    /// Commits everything written so far.
    async fn close(&mut self) -> Result<(), WriterError>;

    /// Abandons the load. Must not fail.
    async fn cancel(&mut self, reason: &str);
}

pub trait TabletWriterFactory: Send + Sync {
    fn create(&self, descriptor: &SinkDescriptor) -> Result<Box<dyn TabletWriter>, WriterError>;
}
