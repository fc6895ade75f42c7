use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::core::batch::BatchError;

/// Coarse classification of WAL failures, used by callers that react per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorKind {
    Resource,
    Format,
    SchemaMismatch,
    State,
}

#[derive(Debug, Error)]
pub enum WalError {
    #[error("No WAL registered for id {0}")]
    UnknownWal(i64),

    #[error("WAL I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid WAL header token '{token}'")]
    InvalidToken { token: String },

    #[error("Duplicate column id {col_id} in WAL header")]
    DuplicateColumnId { col_id: i32 },

    #[error("Corrupt WAL record at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("Column id {col_id} for slot '{slot}' was not recorded in the WAL header")]
    MissingColumn { col_id: i32, slot: String },

    #[error("Schema mismatch for slot '{slot}': {reason}")]
    SchemaMismatch { slot: String, reason: String },

    #[error("WAL header has not been loaded")]
    HeaderNotLoaded,

    #[error("WAL header was already loaded")]
    HeaderAlreadyLoaded,

    #[error("WAL reader used before init")]
    NotInitialized,

    #[error("WAL stream already finalized")]
    Closed,

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

impl WalError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WalError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> WalErrorKind {
        match self {
            WalError::UnknownWal(_) | WalError::Io { .. } => WalErrorKind::Resource,
            WalError::InvalidToken { .. }
            | WalError::DuplicateColumnId { .. }
            | WalError::Corrupt { .. }
            | WalError::Batch(_) => WalErrorKind::Format,
            WalError::MissingColumn { .. } | WalError::SchemaMismatch { .. } => {
                WalErrorKind::SchemaMismatch
            }
            WalError::HeaderNotLoaded
            | WalError::HeaderAlreadyLoaded
            | WalError::NotInitialized
            | WalError::Closed => WalErrorKind::State,
        }
    }
}

/// Failures of the background writer and its transport. `Clone` so the first one can be
/// memoized and handed to every later caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WriterError {
    #[error("Tablet writer open failed: {0}")]
    Open(String),

    #[error("Tablet write failed: {0}")]
    Write(String),

    #[error("Tablet write timed out after {0} ms")]
    Timeout(u64),

    #[error("Tablet writer close failed: {0}")]
    Close(String),

    #[error("Writer cancelled: {0}")]
    Cancelled(String),

    #[error("Writer task panicked: {0}")]
    Panicked(String),

    #[error("Writer is closed")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    #[error("Invalid output expression: {0}")]
    InvalidExpr(String),

    #[error("Output expression binding failed: {0}")]
    Bind(String),

    #[error("Output expression evaluation failed: {0}")]
    Eval(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("{0}")]
    Writer(#[from] WriterError),

    #[error("Group commit WAL error: {0}")]
    Wal(String),

    #[error("Load recovery failed for WAL {wal_id}: {reason}")]
    Recovery { wal_id: i64, reason: String },

    #[error("Cannot {op} while sink is {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    #[error("Load cancelled: {0}")]
    Cancelled(String),
}

impl SinkError {
    /// True for failures that happened while replaying a WAL rather than during live ingestion.
    pub fn is_recovery(&self) -> bool {
        matches!(self, SinkError::Recovery { .. })
    }
}

impl From<BatchError> for SinkError {
    fn from(value: BatchError) -> Self {
        SinkError::Batch(value.to_string())
    }
}

impl From<WalError> for SinkError {
    fn from(value: WalError) -> Self {
        SinkError::Wal(value.to_string())
    }
}
