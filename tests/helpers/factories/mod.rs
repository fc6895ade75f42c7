pub mod mock_tablet_writer_factory;
pub mod row_batch_factory;
pub mod runtime_state_factory;
pub mod schema_factory;
pub mod sink_descriptor_factory;
pub mod wal_file_factory;

#[cfg(test)]
mod row_batch_factory_test;
#[cfg(test)]
mod wal_file_factory_test;

pub use mock_tablet_writer_factory::{MockTabletWriterFactory, TabletLog};
pub use row_batch_factory::RowBatchFactory;
pub use runtime_state_factory::RuntimeStateFactory;
pub use schema_factory::SchemaFactory;
pub use sink_descriptor_factory::SinkDescriptorFactory;
pub use wal_file_factory::{TempWalDir, WalFileFactory};
