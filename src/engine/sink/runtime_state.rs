use std::sync::Arc;

use crate::engine::core::wal::{WalManager, WalWriterOptions};
use crate::engine::core::write::{AsyncWriterOptions, TabletWriterFactory};

/// Per-load execution context shared by the operators of one pipeline.
#[derive(Clone)]
pub struct RuntimeState {
    load_id: String,
    wal_id: Option<i64>,
    wal_manager: Arc<WalManager>,
    writer_factory: Arc<dyn TabletWriterFactory>,
    writer_options: AsyncWriterOptions,
    wal_options: WalWriterOptions,
}

impl RuntimeState {
    pub fn new(
        load_id: impl Into<String>,
        wal_manager: Arc<WalManager>,
        writer_factory: Arc<dyn TabletWriterFactory>,
    ) -> Self {
        Self {
            load_id: load_id.into(),
            wal_id: None,
            wal_manager,
            writer_factory,
            writer_options: AsyncWriterOptions::default(),
            wal_options: WalWriterOptions::default(),
        }
    }

    /// Options taken from the global configuration instead of the built-in defaults.
    pub fn with_configured_options(self) -> Self {
        self.with_writer_options(AsyncWriterOptions::from_config())
            .with_wal_options(WalWriterOptions::from_config())
    }

    pub fn with_wal_id(mut self, wal_id: i64) -> Self {
        self.wal_id = Some(wal_id);
        self
    }

    pub fn with_writer_options(mut self, options: AsyncWriterOptions) -> Self {
        self.writer_options = options;
        self
    }

    pub fn with_wal_options(mut self, options: WalWriterOptions) -> Self {
        self.wal_options = options;
        self
    }

    pub fn load_id(&self) -> &str {
        &self.load_id
    }

    pub fn wal_id(&self) -> Option<i64> {
        self.wal_id
    }

    pub fn wal_manager(&self) -> &Arc<WalManager> {
        &self.wal_manager
    }

    pub fn writer_factory(&self) -> &Arc<dyn TabletWriterFactory> {
        &self.writer_factory
    }

    pub fn writer_options(&self) -> &AsyncWriterOptions {
        &self.writer_options
    }

    pub fn wal_options(&self) -> &WalWriterOptions {
        &self.wal_options
    }
}

impl std::fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeState")
            .field("load_id", &self.load_id)
            .field("wal_id", &self.wal_id)
            .field("wal_dir", &self.wal_manager.base_dir())
            .field("writer_options", &self.writer_options)
            .finish()
    }
}
