use std::fmt;
use std::sync::Arc;

use crate::engine::schema::SchemaDescriptor;
use crate::engine::types::{ColumnType, ScalarValue};

use super::column::{Column, ColumnRef};

/// One named, typed column of a row batch.
#[derive(Debug, Clone)]
pub struct BatchColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub column: ColumnRef,
}

impl BatchColumn {
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType, column: ColumnRef) -> Self {
        Self {
            name: name.into(),
            column_type,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    fn check_type(&self) -> Result<(), BatchError> {
        let actual = self.column.column_type();
        if actual != self.column_type {
            return Err(BatchError::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type,
                got: actual,
            });
        }
        Ok(())
    }
}

/// Columnar block of rows. All columns have the same length.
#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    columns: Vec<BatchColumn>,
}

impl RowBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<BatchColumn>) -> Result<Self, BatchError> {
        let mut batch = Self::new();
        for column in columns {
            batch.push(column)?;
        }
        Ok(batch)
    }

    /// Zero-row batch shaped like `schema`, used as the output container for readers.
    pub fn empty_for(schema: &SchemaDescriptor) -> Self {
        let columns = schema
            .slots()
            .iter()
            .map(|slot| {
                BatchColumn::new(
                    slot.name.clone(),
                    slot.column_type,
                    Arc::new(Column::empty(slot.column_type)),
                )
            })
            .collect();
        Self { columns }
    }

    pub fn insert(&mut self, position: usize, column: BatchColumn) -> Result<(), BatchError> {
        if position > self.columns.len() {
            return Err(BatchError::InvalidPosition {
                position,
                len: self.columns.len(),
            });
        }
        column.check_type()?;
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(BatchError::InconsistentColumnLength {
                    column: position,
                    expected: first.len(),
                    got: column.len(),
                });
            }
        }
        self.columns.insert(position, column);
        Ok(())
    }

    pub fn push(&mut self, column: BatchColumn) -> Result<(), BatchError> {
        self.insert(self.columns.len(), column)
    }

    pub fn swap(&mut self, other: &mut RowBatch) {
        std::mem::swap(&mut self.columns, &mut other.columns);
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map(BatchColumn::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get_by_position(&self, position: usize) -> Result<&BatchColumn, BatchError> {
        self.columns
            .get(position)
            .ok_or(BatchError::ColumnOutOfBounds(position))
    }

    pub fn columns(&self) -> &[BatchColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<BatchColumn> {
        self.columns
    }

    pub fn row(&self, index: usize) -> Result<Vec<ScalarValue>, BatchError> {
        if index >= self.rows() {
            return Err(BatchError::RowOutOfBounds {
                index,
                len: self.rows(),
            });
        }
        self.columns.iter().map(|c| c.column.value(index)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchError {
    InconsistentColumnLength {
        column: usize,
        expected: usize,
        got: usize,
    },
    ColumnOutOfBounds(usize),
    RowOutOfBounds {
        index: usize,
        len: usize,
    },
    InvalidPosition {
        position: usize,
        len: usize,
    },
    TypeMismatch {
        column: String,
        expected: ColumnType,
        got: ColumnType,
    },
    NullInNonNullable {
        column: String,
    },
    Value(String),
    Codec(String),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::InconsistentColumnLength {
                column,
                expected,
                got,
            } => write!(
                f,
                "column {} has inconsistent length: expected {}, got {}",
                column, expected, got
            ),
            BatchError::ColumnOutOfBounds(idx) => write!(f, "column index {} out of bounds", idx),
            BatchError::RowOutOfBounds { index, len } => {
                write!(f, "row index {} out of bounds (len={})", index, len)
            }
            BatchError::InvalidPosition { position, len } => {
                write!(f, "cannot insert at position {} (len={})", position, len)
            }
            BatchError::TypeMismatch {
                column,
                expected,
                got,
            } => write!(
                f,
                "column '{}' declared as {} but holds {}",
                column, expected, got
            ),
            BatchError::NullInNonNullable { column } => {
                write!(f, "null value in non-nullable column '{}'", column)
            }
            BatchError::Value(msg) => write!(f, "invalid value: {}", msg),
            BatchError::Codec(msg) => write!(f, "batch codec error: {}", msg),
        }
    }
}

impl std::error::Error for BatchError {}
