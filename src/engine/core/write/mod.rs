pub mod async_writer;
pub mod local_tablet_writer;
pub mod metrics;
pub mod tablet_writer;

pub use async_writer::{AsyncWriter, AsyncWriterOptions, Submitted};
pub use local_tablet_writer::{LocalTabletWriter, LocalTabletWriterFactory, read_tablet_file};
pub use metrics::WriterMetrics;
pub use tablet_writer::{TabletWriter, TabletWriterFactory};

#[cfg(test)]
mod async_writer_test;
