use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::engine::core::batch::{RowBatch, decode_batch, encode_batch};
use crate::engine::core::wal::to_header;
use crate::engine::core::wal::wal_format::{FrameRead, read_record, write_record};
use crate::engine::errors::{WalError, WriterError};
use crate::engine::sink::SinkDescriptor;
use crate::shared::path::absolutize;
use crate::shared::storage_header::{BinaryHeader, FileKind};

use super::tablet_writer::{TabletWriter, TabletWriterFactory};

pub const TABLET_FILE_EXTENSION: &str = "tablet";

/// File-backed transport: every batch becomes one framed record in `<dir>/<load_id>.tablet`.
pub struct LocalTabletWriter {
    path: PathBuf,
    col_ids: Vec<i32>,
    file: Option<BufWriter<File>>,
    batches: u64,
    rows: u64,
}

impl LocalTabletWriter {
    pub fn new(path: PathBuf, col_ids: Vec<i32>) -> Self {
        Self {
            path,
            col_ids,
            file: None,
            batches: 0,
            rows: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> WriterError {
        WriterError::Write(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl TabletWriter for LocalTabletWriter {
    async fn open(&mut self) -> Result<(), WriterError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| WriterError::Open(format!("{}: {}", self.path.display(), e)))?;
        let mut file = BufWriter::new(file);

        FileKind::TabletFile
            .header()
            .write_to(&mut file)
            .and_then(|_| write_record(&mut file, to_header(&self.col_ids).as_bytes()))
            .map_err(|e| WriterError::Open(format!("{}: {}", self.path.display(), e)))?;

        info!(target: "olap_ingest::local_tablet_writer::open", path = ?self.path, "Opened tablet file");
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, batch: RowBatch) -> Result<(), WriterError> {
        let payload = encode_batch(&batch).map_err(|e| WriterError::Write(e.to_string()))?;
        let result = match self.file.as_mut() {
            Some(file) => write_record(file, &payload).and_then(|_| file.flush()),
            None => return Err(WriterError::Closed),
        };
        result.map_err(|e| self.io_error(e))?;

        self.batches += 1;
        self.rows += batch.rows() as u64;
        debug!(
            target: "olap_ingest::local_tablet_writer::write",
            path = ?self.path, rows = batch.rows(), total_rows = self.rows,
            "Wrote batch to tablet file"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WriterError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()
            .and_then(|_| file.get_ref().sync_all())
            .map_err(|e| WriterError::Close(format!("{}: {}", self.path.display(), e)))?;

        info!(
            target: "olap_ingest::local_tablet_writer::close",
            path = ?self.path, batches = self.batches, rows = self.rows,
            "Closed tablet file"
        );
        Ok(())
    }

    async fn cancel(&mut self, reason: &str) {
        self.file = None;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(target: "olap_ingest::local_tablet_writer::cancel", path = ?self.path, error = %e, "Failed to remove partial tablet file");
            }
        }
        warn!(target: "olap_ingest::local_tablet_writer::cancel", path = ?self.path, reason, "Tablet load cancelled");
    }
}

/// Creates one `LocalTabletWriter` per load under a fixed directory.
#[derive(Debug, Clone)]
pub struct LocalTabletWriterFactory {
    dir: PathBuf,
}

impl LocalTabletWriterFactory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, WriterError> {
        let dir = absolutize(dir);
        std::fs::create_dir_all(&dir)
            .map_err(|e| WriterError::Open(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn tablet_path(&self, load_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", load_id, TABLET_FILE_EXTENSION))
    }
}

impl TabletWriterFactory for LocalTabletWriterFactory {
    fn create(&self, descriptor: &SinkDescriptor) -> Result<Box<dyn TabletWriter>, WriterError> {
        Ok(Box::new(LocalTabletWriter::new(
            self.tablet_path(&descriptor.load_id),
            descriptor.output_schema.col_ids(),
        )))
    }
}

/// Reads back every batch of a tablet file written by `LocalTabletWriter`.
pub fn read_tablet_file(path: &Path) -> Result<Vec<RowBatch>, WalError> {
    let file = File::open(path).map_err(|e| WalError::io(path, e))?;
    let mut reader = BufReader::new(file);
    BinaryHeader::read_expecting(&mut reader, FileKind::TabletFile).map_err(|e| {
        WalError::Corrupt {
            offset: 0,
            reason: format!("invalid tablet file header: {}", e),
        }
    })?;

    let mut offset = BinaryHeader::TOTAL_LEN as u64;
    if read_record(&mut reader, &mut offset, path)? == FrameRead::EndOfStream {
        return Err(WalError::Corrupt {
            offset,
            reason: "missing header record".into(),
        });
    }

    let mut batches = Vec::new();
    loop {
        let record_offset = offset;
        match read_record(&mut reader, &mut offset, path)? {
            FrameRead::Record(payload) => {
                let batch = decode_batch(&payload).map_err(|e| WalError::Corrupt {
                    offset: record_offset,
                    reason: e.to_string(),
                })?;
                batches.push(batch);
            }
            FrameRead::EndOfStream => break,
        }
    }
    Ok(batches)
}
