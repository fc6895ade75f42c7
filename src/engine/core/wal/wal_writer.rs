use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::core::batch::{RowBatch, encode_batch};
use crate::engine::errors::WalError;
use crate::shared::config::CONFIG;
use crate::shared::storage_header::FileKind;

use super::column_pos_map::to_header;
use super::wal_format::write_record;

#[derive(Debug, Clone)]
pub struct WalWriterOptions {
    pub fsync: bool,
    pub buffer_size: usize,
    pub flush_each_write: bool,
}

impl WalWriterOptions {
    pub fn from_config() -> Self {
        Self {
            fsync: CONFIG.wal.fsync,
            buffer_size: CONFIG.wal.buffer_size,
            flush_each_write: CONFIG.wal.flush_each_write,
        }
    }
}

impl Default for WalWriterOptions {
    fn default() -> Self {
        Self {
            fsync: false,
            buffer_size: 64 * 1024,
            flush_each_write: false,
        }
    }
}

/// Appends row batches to a single WAL file: file header, column-ID header record,
/// then one framed record per batch.
pub struct WalWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    options: WalWriterOptions,
    batches_written: u64,
    rows_written: u64,
}

impl WalWriter {
    pub fn create(
        path: &Path,
        col_ids: &[i32],
        options: WalWriterOptions,
    ) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
            .map_err(|e| WalError::io(path, e))?;
        let mut file = BufWriter::with_capacity(options.buffer_size, file);

        let header = to_header(col_ids);
        FileKind::WalLog
            .header()
            .write_to(&mut file)
            .and_then(|_| write_record(&mut file, header.as_bytes()))
            .and_then(|_| file.flush())
            .map_err(|e| WalError::io(path, e))?;

        info!(
            target: "olap_ingest::wal_writer::create",
            ?path, header = %header,
            "Created WAL file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            options,
            batches_written: 0,
            rows_written: 0,
        })
    }

    pub fn append_batch(&mut self, batch: &RowBatch) -> Result<(), WalError> {
        let file = self.file.as_mut().ok_or(WalError::Closed)?;
        let payload = encode_batch(batch)?;

        write_record(file, &payload).map_err(|e| WalError::io(&self.path, e))?;
        if self.options.flush_each_write {
            file.flush().map_err(|e| WalError::io(&self.path, e))?;
        }

        self.batches_written += 1;
        self.rows_written += batch.rows() as u64;
        debug!(
            target: "olap_ingest::wal_writer::append_batch",
            path = ?self.path, rows = batch.rows(), bytes = payload.len(),
            total_batches = self.batches_written,
            "Appended batch to WAL"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes and, when configured, fsyncs the file. Later calls are no-ops.
    pub fn finalize(&mut self) -> Result<(), WalError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        file.flush().map_err(|e| WalError::io(&self.path, e))?;
        if self.options.fsync {
            file.get_ref()
                .sync_all()
                .map_err(|e| WalError::io(&self.path, e))?;
        }

        info!(
            target: "olap_ingest::wal_writer::finalize",
            path = ?self.path, batches = self.batches_written, rows = self.rows_written,
            "WAL file finalized"
        );
        Ok(())
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!(target: "olap_ingest::wal_writer::drop", path = ?self.path, error = %e, "WAL finalize on drop failed");
        }
    }
}
