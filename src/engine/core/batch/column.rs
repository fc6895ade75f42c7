use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::types::{ColumnType, LogicalType, ScalarValue};

use super::BatchError;

/// Shared, immutable column handle. Moving a column between batches clones the `Arc`,
/// never the values.
pub type ColumnRef = Arc<Column>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
}

impl ColumnData {
    pub fn with_capacity(logical: LogicalType, capacity: usize) -> Self {
        match logical {
            LogicalType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            LogicalType::Int64 => ColumnData::Int64(Vec::with_capacity(capacity)),
            LogicalType::Float64 => ColumnData::Float64(Vec::with_capacity(capacity)),
            LogicalType::Utf8 => ColumnData::Utf8(Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            ColumnData::Boolean(_) => LogicalType::Boolean,
            ColumnData::Int64(_) => LogicalType::Int64,
            ColumnData::Float64(_) => LogicalType::Float64,
            ColumnData::Utf8(_) => LogicalType::Utf8,
        }
    }

    fn value(&self, row: usize) -> ScalarValue {
        match self {
            ColumnData::Boolean(v) => ScalarValue::Boolean(v[row]),
            ColumnData::Int64(v) => ScalarValue::Int64(v[row]),
            ColumnData::Float64(v) => ScalarValue::Float64(v[row]),
            ColumnData::Utf8(v) => ScalarValue::Utf8(v[row].clone()),
        }
    }

    /// Appends a value; `Null` stores the type's default and must be masked by the caller.
    fn push(&mut self, value: &ScalarValue) -> Result<(), String> {
        match (self, value) {
            (ColumnData::Boolean(v), ScalarValue::Null) => v.push(false),
            (ColumnData::Int64(v), ScalarValue::Null) => v.push(0),
            (ColumnData::Float64(v), ScalarValue::Null) => v.push(0.0),
            (ColumnData::Utf8(v), ScalarValue::Null) => v.push(String::new()),
            (ColumnData::Boolean(v), ScalarValue::Boolean(b)) => v.push(*b),
            (ColumnData::Int64(v), ScalarValue::Int64(i)) => v.push(*i),
            (ColumnData::Float64(v), ScalarValue::Float64(f)) => v.push(*f),
            (ColumnData::Utf8(v), ScalarValue::Utf8(s)) => v.push(s.clone()),
            (data, value) => {
                return Err(format!(
                    "value {:?} does not fit a {} column",
                    value,
                    data.logical_type()
                ));
            }
        }
        Ok(())
    }
}

/// Typed values plus an optional null map. A column that carries a null map is nullable,
/// even when no entry in it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    data: ColumnData,
    nulls: Option<Vec<bool>>,
}

impl Column {
    pub fn new(data: ColumnData) -> Self {
        Self { data, nulls: None }
    }

    pub fn with_nulls(data: ColumnData, nulls: Vec<bool>) -> Result<Self, BatchError> {
        if nulls.len() != data.len() {
            return Err(BatchError::InconsistentColumnLength {
                column: 0,
                expected: data.len(),
                got: nulls.len(),
            });
        }
        Ok(Self {
            data,
            nulls: Some(nulls),
        })
    }

    pub fn empty(column_type: ColumnType) -> Self {
        let data = ColumnData::with_capacity(column_type.logical, 0);
        if column_type.nullable {
            Self {
                data,
                nulls: Some(Vec::new()),
            }
        } else {
            Self::new(data)
        }
    }

    pub fn from_scalars(
        column_type: ColumnType,
        values: &[ScalarValue],
    ) -> Result<Self, BatchError> {
        let mut data = ColumnData::with_capacity(column_type.logical, values.len());
        let mut nulls = Vec::with_capacity(values.len());

        for value in values {
            if value.is_null() && !column_type.nullable {
                return Err(BatchError::NullInNonNullable {
                    column: column_type.to_string(),
                });
            }
            data.push(value).map_err(BatchError::Value)?;
            nulls.push(value.is_null());
        }

        Ok(Self {
            data,
            nulls: column_type.nullable.then_some(nulls),
        })
    }

    pub fn repeat(
        column_type: ColumnType,
        value: &ScalarValue,
        rows: usize,
    ) -> Result<Self, BatchError> {
        Self::from_scalars(column_type, &vec![value.clone(); rows])
    }

    pub fn boolean(values: Vec<bool>) -> Self {
        Self::new(ColumnData::Boolean(values))
    }

    pub fn int64(values: Vec<i64>) -> Self {
        Self::new(ColumnData::Int64(values))
    }

    pub fn float64(values: Vec<f64>) -> Self {
        Self::new(ColumnData::Float64(values))
    }

    pub fn utf8<S: Into<String>>(values: Vec<S>) -> Self {
        Self::new(ColumnData::Utf8(values.into_iter().map(Into::into).collect()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn nulls(&self) -> Option<&[bool]> {
        self.nulls.as_deref()
    }

    pub fn logical_type(&self) -> LogicalType {
        self.data.logical_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.nulls.is_some()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType {
            logical: self.logical_type(),
            nullable: self.is_nullable(),
        }
    }

    pub fn null_count(&self) -> usize {
        self.nulls
            .as_ref()
            .map(|n| n.iter().filter(|is_null| **is_null).count())
            .unwrap_or(0)
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.nulls
            .as_ref()
            .and_then(|n| n.get(row).copied())
            .unwrap_or(false)
    }

    pub fn value(&self, row: usize) -> Result<ScalarValue, BatchError> {
        if row >= self.len() {
            return Err(BatchError::RowOutOfBounds {
                index: row,
                len: self.len(),
            });
        }
        if self.is_null(row) {
            return Ok(ScalarValue::Null);
        }
        Ok(self.data.value(row))
    }

    pub fn values(&self) -> Vec<ScalarValue> {
        (0..self.len())
            .map(|row| {
                if self.is_null(row) {
                    ScalarValue::Null
                } else {
                    self.data.value(row)
                }
            })
            .collect()
    }

    /// Wraps the values in an all-valid null map; values are untouched.
    pub fn into_nullable(self) -> Self {
        if self.nulls.is_some() {
            return self;
        }
        let len = self.data.len();
        Self {
            data: self.data,
            nulls: Some(vec![false; len]),
        }
    }

    /// Drops the null map. Fails when any entry is null.
    pub fn into_non_nullable(self, name: &str) -> Result<Self, BatchError> {
        if self.null_count() > 0 {
            return Err(BatchError::NullInNonNullable {
                column: name.to_string(),
            });
        }
        Ok(Self::new(self.data))
    }
}

pub fn make_nullable(column: ColumnRef) -> ColumnRef {
    if column.is_nullable() {
        return column;
    }
    Arc::new(Arc::unwrap_or_clone(column).into_nullable())
}
