mod codec;
mod column;
mod row_batch;

pub use codec::{decode_batch, encode_batch};
pub use column::{Column, ColumnData, ColumnRef, make_nullable};
pub use row_batch::{BatchColumn, BatchError, RowBatch};

#[cfg(test)]
mod column_test;
