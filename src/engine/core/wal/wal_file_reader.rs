use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::errors::WalError;
use crate::shared::storage_header::{BinaryHeader, FileKind};

use super::wal_format::{FrameRead, read_record};

#[derive(Debug, PartialEq)]
pub enum WalRecord {
    Block(Vec<u8>),
    EndOfStream,
}

/// Sequential reader over the raw records of one WAL file.
pub struct WalFileReader {
    path: PathBuf,
    stream: Option<BufReader<File>>,
    offset: u64,
    header_read: bool,
}

impl WalFileReader {
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = File::open(path).map_err(|e| WalError::io(path, e))?;
        let mut stream = BufReader::new(file);

        BinaryHeader::read_expecting(&mut stream, FileKind::WalLog).map_err(|e| {
            WalError::Corrupt {
                offset: 0,
                reason: format!("invalid WAL file header: {}", e),
            }
        })?;

        debug!(target: "olap_ingest::wal_file_reader::open", ?path, "Opened WAL file");
        Ok(Self {
            path: path.to_path_buf(),
            stream: Some(stream),
            offset: BinaryHeader::TOTAL_LEN as u64,
            header_read: false,
        })
    }

    /// Reads the column-ID header record. Must be the first read on the stream.
    ///
    /// A failed read releases the stream: the position inside the file is no longer known, so
    /// every later call fails with `Closed`.
    pub fn read_header(&mut self) -> Result<String, WalError> {
        if self.header_read {
            return Err(WalError::HeaderAlreadyLoaded);
        }
        let result = self.read_header_record();
        if result.is_err() {
            self.finalize();
        }
        result
    }

    fn read_header_record(&mut self) -> Result<String, WalError> {
        let header_offset = self.offset;
        let stream = self.stream.as_mut().ok_or(WalError::Closed)?;

        let bytes = match read_record(stream, &mut self.offset, &self.path)? {
            FrameRead::Record(bytes) => bytes,
            FrameRead::EndOfStream => {
                return Err(WalError::Corrupt {
                    offset: header_offset,
                    reason: "missing header record".into(),
                });
            }
        };

        let header = String::from_utf8(bytes).map_err(|e| WalError::Corrupt {
            offset: header_offset,
            reason: format!("header is not valid UTF-8: {}", e),
        })?;
        self.header_read = true;
        Ok(header)
    }

    pub fn read_block(&mut self) -> Result<WalRecord, WalError> {
        if !self.header_read {
            return Err(WalError::HeaderNotLoaded);
        }
        let stream = self.stream.as_mut().ok_or(WalError::Closed)?;

        match read_record(stream, &mut self.offset, &self.path)? {
            FrameRead::Record(bytes) => Ok(WalRecord::Block(bytes)),
            FrameRead::EndOfStream => Ok(WalRecord::EndOfStream),
        }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finalized(&self) -> bool {
        self.stream.is_none()
    }

    /// Releases the file handle. Later calls are no-ops.
    pub fn finalize(&mut self) {
        if self.stream.take().is_some() {
            debug!(target: "olap_ingest::wal_file_reader::finalize", path = ?self.path, offset = self.offset, "Closed WAL file");
        }
    }
}
