use lz4_flex::block::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};

use crate::engine::types::ColumnType;

use super::{BatchColumn, BatchError, Column, RowBatch};
use std::sync::Arc;

#[derive(Serialize)]
struct EncodedColumnRef<'a> {
    name: &'a str,
    column_type: ColumnType,
    column: &'a Column,
}

#[derive(Deserialize)]
struct EncodedColumn {
    name: String,
    column_type: ColumnType,
    column: Column,
}

/// Serializes a batch into a self-contained payload: bincode column list, LZ4 block
/// compressed with the uncompressed size prepended.
pub fn encode_batch(batch: &RowBatch) -> Result<Vec<u8>, BatchError> {
    let columns: Vec<EncodedColumnRef<'_>> = batch
        .columns()
        .iter()
        .map(|c| EncodedColumnRef {
            name: &c.name,
            column_type: c.column_type,
            column: c.column.as_ref(),
        })
        .collect();

    let raw = bincode::serialize(&columns).map_err(|e| BatchError::Codec(e.to_string()))?;
    Ok(compress_prepend_size(&raw))
}

pub fn decode_batch(payload: &[u8]) -> Result<RowBatch, BatchError> {
    let raw = decompress_size_prepended(payload)
        .map_err(|e| BatchError::Codec(format!("lz4 decompress: {}", e)))?;
    let columns: Vec<EncodedColumn> =
        bincode::deserialize(&raw).map_err(|e| BatchError::Codec(e.to_string()))?;

    RowBatch::from_columns(
        columns
            .into_iter()
            .map(|c| BatchColumn::new(c.name, c.column_type, Arc::new(c.column)))
            .collect(),
    )
}
