use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::engine::core::batch::{RowBatch, encode_batch};
use crate::engine::core::wal::wal_format::write_record;
use crate::engine::core::wal::{WalManager, WalWriter, WalWriterOptions};
use crate::shared::storage_header::FileKind;

/// A WAL directory in a temp dir plus its manager. The dir lives as long as this value.
pub struct TempWalDir {
    manager: Arc<WalManager>,
    _tempdir: TempDir,
}

impl TempWalDir {
    pub fn new() -> Self {
        let tempdir = tempfile::tempdir().expect("Failed to create temp dir");
        let manager = WalManager::open(tempdir.path()).expect("Failed to open WAL dir");
        Self {
            manager: Arc::new(manager),
            _tempdir: tempdir,
        }
    }

    pub fn manager(&self) -> Arc<WalManager> {
        Arc::clone(&self.manager)
    }
}

/// Writes a WAL file through `WalWriter`, or with a raw header when one is given.
pub struct WalFileFactory {
    wal_id: i64,
    label: String,
    col_ids: Vec<i32>,
    raw_header: Option<String>,
    batches: Vec<RowBatch>,
    trailing_bytes: Vec<u8>,
}

impl WalFileFactory {
    pub fn new() -> Self {
        Self {
            wal_id: 1,
            label: "test".to_string(),
            col_ids: vec![10, 11, 12],
            raw_header: None,
            batches: Vec::new(),
            trailing_bytes: Vec::new(),
        }
    }

    pub fn with_wal_id(mut self, wal_id: i64) -> Self {
        self.wal_id = wal_id;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_col_ids(mut self, col_ids: &[i32]) -> Self {
        self.col_ids = col_ids.to_vec();
        self
    }

    /// Header text written verbatim instead of the rendered column IDs.
    pub fn with_raw_header(mut self, header: &str) -> Self {
        self.raw_header = Some(header.to_string());
        self
    }

    pub fn with_batch(mut self, batch: RowBatch) -> Self {
        self.batches.push(batch);
        self
    }

    /// Bytes appended after the last record, e.g. a torn write.
    pub fn with_trailing_bytes(mut self, bytes: &[u8]) -> Self {
        self.trailing_bytes = bytes.to_vec();
        self
    }

    pub fn create(self, manager: &WalManager) -> PathBuf {
        let path = manager.create_wal_path(self.wal_id, &self.label);

        match &self.raw_header {
            None => {
                let mut writer =
                    WalWriter::create(&path, &self.col_ids, WalWriterOptions::default())
                        .expect("Failed to create WAL");
                for batch in &self.batches {
                    writer.append_batch(batch).expect("Failed to append batch");
                }
                writer.finalize().expect("Failed to finalize WAL");
            }
            Some(header) => {
                let file = OpenOptions::new()
                    .create_new(true)
                    .write(true)
                    .open(&path)
                    .expect("Failed to create WAL file");
                let mut out = BufWriter::new(file);
                FileKind::WalLog.header().write_to(&mut out).unwrap();
                write_record(&mut out, header.as_bytes()).unwrap();
                for batch in &self.batches {
                    write_record(&mut out, &encode_batch(batch).unwrap()).unwrap();
                }
                out.flush().unwrap();
            }
        }

        if !self.trailing_bytes.is_empty() {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&self.trailing_bytes).unwrap();
        }

        path
    }
}
