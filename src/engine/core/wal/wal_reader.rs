use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::core::batch::{BatchColumn, ColumnRef, RowBatch, decode_batch, make_nullable};
use crate::engine::errors::WalError;
use crate::engine::schema::{SchemaDescriptor, SlotDescriptor};

use super::column_pos_map::ColumnPositionMap;
use super::wal_file_reader::{WalFileReader, WalRecord};
use super::wal_manager::WalManager;

/// Replays one WAL file as row batches shaped like a target schema.
///
/// Columns are matched purely by column ID: the header records which position each ID had
/// when the log was written, so replay survives schema changes that reorder or add columns.
pub struct WalReader {
    wal_id: i64,
    wal_manager: Arc<WalManager>,
    wal_path: Option<PathBuf>,
    target_schema: Option<Arc<SchemaDescriptor>>,
    stream: Option<WalFileReader>,
    column_pos_map: Option<ColumnPositionMap>,
    eof: bool,
    finalized: bool,
    batches_read: u64,
    rows_read: u64,
}

impl WalReader {
    pub fn new(wal_id: i64, wal_manager: Arc<WalManager>) -> Self {
        Self {
            wal_id,
            wal_manager,
            wal_path: None,
            target_schema: None,
            stream: None,
            column_pos_map: None,
            eof: false,
            finalized: false,
            batches_read: 0,
            rows_read: 0,
        }
    }

    /// Resolves the WAL path and opens the stream.
    pub fn init(&mut self, target_schema: Arc<SchemaDescriptor>) -> Result<(), WalError> {
        if self.finalized {
            return Err(WalError::Closed);
        }

        let path = self.wal_manager.get_wal_path(self.wal_id)?;
        let stream = WalFileReader::open(&path)?;

        info!(
            target: "olap_ingest::wal_reader::init",
            wal_id = self.wal_id, ?path, slots = target_schema.slot_count(),
            "WAL reader initialized"
        );

        self.wal_path = Some(path);
        self.stream = Some(stream);
        self.target_schema = Some(target_schema);
        Ok(())
    }

    /// Reads the header record and builds the column position map. Exactly once, before
    /// the first `next_batch`.
    pub fn load_header(&mut self) -> Result<&ColumnPositionMap, WalError> {
        if self.finalized {
            return Err(WalError::Closed);
        }
        if self.column_pos_map.is_some() {
            return Err(WalError::HeaderAlreadyLoaded);
        }
        let stream = self.stream.as_mut().ok_or(WalError::NotInitialized)?;

        let header = stream.read_header()?;
        let map = ColumnPositionMap::parse(&header)?;
        if map.is_empty() {
            warn!(target: "olap_ingest::wal_reader::load_header", wal_id = self.wal_id, "WAL header lists no columns");
        }

        debug!(
            target: "olap_ingest::wal_reader::load_header",
            wal_id = self.wal_id, header = %header, columns = map.len(),
            "Loaded WAL header"
        );
        Ok(self.column_pos_map.insert(map))
    }

    pub fn column_position_map(&self) -> Option<&ColumnPositionMap> {
        self.column_pos_map.as_ref()
    }

    /// Reads the next record into `batch`, replacing its contents.
    ///
    /// Returns `(rows, eof)`. End of stream is `(0, true)` and is repeated on every later
    /// call. On error `batch` is left as it was.
    ///
    /// # Panics
    /// If `batch` does not have one column per target slot.
    pub fn next_batch(&mut self, batch: &mut RowBatch) -> Result<(usize, bool), WalError> {
        if self.finalized {
            return Err(WalError::Closed);
        }
        let schema = Arc::clone(self.target_schema.as_ref().ok_or(WalError::NotInitialized)?);
        let map = self
            .column_pos_map
            .as_ref()
            .ok_or(WalError::HeaderNotLoaded)?;

        assert_eq!(
            batch.column_count(),
            schema.slot_count(),
            "output batch must have one column per target slot"
        );

        if self.eof {
            return Ok((0, true));
        }

        let stream = self.stream.as_mut().ok_or(WalError::NotInitialized)?;
        let record_offset = stream.offset();
        let payload = match stream.read_block() {
            Ok(WalRecord::Block(payload)) => payload,
            Ok(WalRecord::EndOfStream) => {
                info!(
                    target: "olap_ingest::wal_reader::next_batch",
                    wal_id = self.wal_id, path = ?self.wal_path,
                    batches = self.batches_read, rows = self.rows_read,
                    "Read EOF on WAL"
                );
                self.eof = true;
                return Ok((0, true));
            }
            Err(e) => {
                warn!(
                    target: "olap_ingest::wal_reader::next_batch",
                    wal_id = self.wal_id, path = ?self.wal_path, error = %e,
                    "Failed to read WAL"
                );
                return Err(e);
            }
        };

        let source = decode_batch(&payload).map_err(|e| WalError::Corrupt {
            offset: record_offset,
            reason: e.to_string(),
        })?;
        let mut target = build_target_batch(&schema, map, source, batch, record_offset)?;

        batch.swap(&mut target);
        let rows = batch.rows();
        self.batches_read += 1;
        self.rows_read += rows as u64;

        debug!(target: "olap_ingest::wal_reader::next_batch", wal_id = self.wal_id, rows, "Read WAL block");
        Ok((rows, false))
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn batches_read(&self) -> u64 {
        self.batches_read
    }

    pub fn wal_id(&self) -> i64 {
        self.wal_id
    }

    /// Releases the underlying stream. Only the first call has an effect.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if let Some(mut stream) = self.stream.take() {
            stream.finalize();
        }
        debug!(target: "olap_ingest::wal_reader::finalize", wal_id = self.wal_id, "WAL reader finalized");
    }
}

impl Drop for WalReader {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Builds the target batch column by column in target-slot order. Names and declared types
/// come from the caller's template, values from the source record.
fn build_target_batch(
    schema: &SchemaDescriptor,
    map: &ColumnPositionMap,
    source: RowBatch,
    template: &RowBatch,
    record_offset: u64,
) -> Result<RowBatch, WalError> {
    let source_width = source.column_count();
    let mut source_columns: Vec<Option<ColumnRef>> = source
        .into_columns()
        .into_iter()
        .map(|c| Some(c.column))
        .collect();

    let mut target = RowBatch::new();
    for (index, slot) in schema.slots().iter().enumerate() {
        let pos = map
            .position(slot.col_unique_id)
            .ok_or_else(|| WalError::MissingColumn {
                col_id: slot.col_unique_id,
                slot: slot.name.clone(),
            })?;

        let column = source_columns
            .get_mut(pos)
            .and_then(Option::take)
            .ok_or_else(|| WalError::Corrupt {
                offset: record_offset,
                reason: format!(
                    "column id {} recorded at position {} but record has {} columns",
                    slot.col_unique_id, pos, source_width
                ),
            })?;

        let column = reconcile_column(slot, column)?;
        let declared = template.get_by_position(index)?;
        target
            .insert(
                index,
                BatchColumn::new(declared.name.clone(), declared.column_type, column),
            )
            .map_err(|e| WalError::SchemaMismatch {
                slot: slot.name.clone(),
                reason: e.to_string(),
            })?;
    }

    Ok(target)
}

fn reconcile_column(slot: &SlotDescriptor, column: ColumnRef) -> Result<ColumnRef, WalError> {
    let wanted = slot.column_type;
    if column.logical_type() != wanted.logical {
        return Err(WalError::SchemaMismatch {
            slot: slot.name.clone(),
            reason: format!(
                "logged column is {} but slot expects {}",
                column.logical_type(),
                wanted.logical
            ),
        });
    }

    match (wanted.nullable, column.is_nullable()) {
        (true, false) => Ok(make_nullable(column)),
        (false, true) => Arc::unwrap_or_clone(column)
            .into_non_nullable(&slot.name)
            .map(Arc::new)
            .map_err(|e| WalError::SchemaMismatch {
                slot: slot.name.clone(),
                reason: e.to_string(),
            }),
        _ => Ok(column),
    }
}
