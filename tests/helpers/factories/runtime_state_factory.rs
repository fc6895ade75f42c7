use std::sync::Arc;

use crate::engine::core::wal::WalManager;
use crate::engine::core::write::{AsyncWriterOptions, TabletWriterFactory};
use crate::engine::sink::RuntimeState;
use crate::test_helpers::factories::{MockTabletWriterFactory, TempWalDir};

/// Runtime state over a temp WAL directory. Keep the factory alive for the whole test.
pub struct RuntimeStateFactory {
    wal_dir: TempWalDir,
    load_id: String,
    wal_id: Option<i64>,
    writer_factory: Option<Arc<dyn TabletWriterFactory>>,
    writer_options: AsyncWriterOptions,
}

impl RuntimeStateFactory {
    pub fn new() -> Self {
        Self {
            wal_dir: TempWalDir::new(),
            load_id: "load-1".to_string(),
            wal_id: None,
            writer_factory: None,
            writer_options: AsyncWriterOptions::default(),
        }
    }

    pub fn with_load_id(mut self, load_id: &str) -> Self {
        self.load_id = load_id.to_string();
        self
    }

    pub fn with_wal_id(mut self, wal_id: i64) -> Self {
        self.wal_id = Some(wal_id);
        self
    }

    pub fn with_writer_factory(mut self, factory: Arc<dyn TabletWriterFactory>) -> Self {
        self.writer_factory = Some(factory);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.writer_options.queue_capacity = capacity;
        self
    }

    pub fn with_write_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.writer_options.write_timeout_ms = timeout_ms;
        self
    }

    pub fn wal_manager(&self) -> Arc<WalManager> {
        self.wal_dir.manager()
    }

    pub fn create(&self) -> RuntimeState {
        let writer_factory = self
            .writer_factory
            .clone()
            .unwrap_or_else(|| MockTabletWriterFactory::new().build().0);
        let state = RuntimeState::new(self.load_id.clone(), self.wal_dir.manager(), writer_factory)
            .with_writer_options(self.writer_options.clone());
        match self.wal_id {
            Some(wal_id) => state.with_wal_id(wal_id),
            None => state,
        }
    }
}
