use std::sync::Arc;

use crate::engine::core::batch::{BatchColumn, Column, ColumnData, RowBatch};
use crate::engine::types::{ColumnType, LogicalType, ScalarValue};

/// Builds row batches column by column. Every column must have the same length.
pub struct RowBatchFactory {
    columns: Vec<BatchColumn>,
}

impl RowBatchFactory {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: &str, column: Column) -> Self {
        let column_type = column.column_type();
        self.columns
            .push(BatchColumn::new(name, column_type, Arc::new(column)));
        self
    }

    pub fn with_int64(self, name: &str, values: Vec<i64>) -> Self {
        self.with_column(name, Column::int64(values))
    }

    pub fn with_nullable_int64(self, name: &str, values: Vec<Option<i64>>) -> Self {
        let scalars: Vec<ScalarValue> = values
            .into_iter()
            .map(|v| v.map(ScalarValue::Int64).unwrap_or(ScalarValue::Null))
            .collect();
        let column = Column::from_scalars(ColumnType::nullable(LogicalType::Int64), &scalars)
            .expect("valid nullable int64 column");
        self.with_column(name, column)
    }

    pub fn with_float64(self, name: &str, values: Vec<f64>) -> Self {
        self.with_column(name, Column::float64(values))
    }

    pub fn with_boolean(self, name: &str, values: Vec<bool>) -> Self {
        self.with_column(name, Column::boolean(values))
    }

    pub fn with_utf8(self, name: &str, values: Vec<&str>) -> Self {
        self.with_column(name, Column::utf8(values))
    }

    pub fn with_nullable_utf8(self, name: &str, values: Vec<Option<&str>>) -> Self {
        let nulls: Vec<bool> = values.iter().map(Option::is_none).collect();
        let data = ColumnData::Utf8(
            values
                .into_iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect(),
        );
        let column = Column::with_nulls(data, nulls).expect("valid nullable utf8 column");
        self.with_column(name, column)
    }

    /// `rows` sequential ids starting at `start` plus a matching `name-<id>` column.
    pub fn sequential(self, start: i64, rows: usize) -> Self {
        let ids: Vec<i64> = (start..start + rows as i64).collect();
        let names: Vec<String> = ids.iter().map(|id| format!("name-{}", id)).collect();
        self.with_int64("id", ids)
            .with_column("name", Column::utf8(names))
    }

    pub fn create(self) -> RowBatch {
        RowBatch::from_columns(self.columns).expect("test batch columns must line up")
    }
}
