pub use super::factories::{
    MockTabletWriterFactory, RowBatchFactory, RuntimeStateFactory, SchemaFactory,
    SinkDescriptorFactory, WalFileFactory,
};

pub struct Factory;

impl Factory {
    pub fn schema() -> SchemaFactory {
        SchemaFactory::new()
    }

    pub fn row_batch() -> RowBatchFactory {
        RowBatchFactory::new()
    }

    pub fn wal_file() -> WalFileFactory {
        WalFileFactory::new()
    }

    pub fn sink_descriptor() -> SinkDescriptorFactory {
        SinkDescriptorFactory::new()
    }

    pub fn runtime_state() -> RuntimeStateFactory {
        RuntimeStateFactory::new()
    }

    pub fn tablet_writer() -> MockTabletWriterFactory {
        MockTabletWriterFactory::new()
    }
}
