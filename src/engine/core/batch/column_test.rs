use std::sync::Arc;

use super::{BatchError, Column, ColumnData, make_nullable};
use crate::engine::types::{ColumnType, LogicalType, ScalarValue};

#[test]
fn make_nullable_keeps_values_and_sets_no_nulls() {
    let column = Arc::new(Column::int64(vec![1, 2, 3]));
    assert!(!column.is_nullable());

    let nullable = make_nullable(column);
    assert!(nullable.is_nullable());
    assert_eq!(nullable.null_count(), 0);
    assert_eq!(nullable.data(), &ColumnData::Int64(vec![1, 2, 3]));
    assert_eq!(nullable.nulls(), Some(&[false, false, false][..]));
}

#[test]
fn make_nullable_is_noop_for_nullable_column() {
    let column = Arc::new(
        Column::from_scalars(
            ColumnType::nullable(LogicalType::Utf8),
            &[ScalarValue::Utf8("a".into()), ScalarValue::Null],
        )
        .unwrap(),
    );
    let same = make_nullable(Arc::clone(&column));
    assert!(Arc::ptr_eq(&column, &same));
    assert_eq!(same.null_count(), 1);
}

#[test]
fn from_scalars_rejects_null_in_non_nullable() {
    let err = Column::from_scalars(
        ColumnType::non_nullable(LogicalType::Int64),
        &[ScalarValue::Int64(1), ScalarValue::Null],
    )
    .unwrap_err();
    assert!(matches!(err, BatchError::NullInNonNullable { .. }));
}

#[test]
fn from_scalars_rejects_wrong_value_type() {
    let err = Column::from_scalars(
        ColumnType::non_nullable(LogicalType::Int64),
        &[ScalarValue::Utf8("x".into())],
    )
    .unwrap_err();
    assert!(matches!(err, BatchError::Value(_)));
}

#[test]
fn values_report_nulls() {
    let column = Column::from_scalars(
        ColumnType::nullable(LogicalType::Float64),
        &[ScalarValue::Float64(1.5), ScalarValue::Null],
    )
    .unwrap();

    assert_eq!(column.values(), vec![ScalarValue::Float64(1.5), ScalarValue::Null]);
    assert_eq!(column.value(1).unwrap(), ScalarValue::Null);
    assert!(matches!(
        column.value(2),
        Err(BatchError::RowOutOfBounds { index: 2, len: 2 })
    ));
}

#[test]
fn into_non_nullable_requires_no_nulls() {
    let clean = Column::int64(vec![4, 5]).into_nullable();
    let stripped = clean.into_non_nullable("k").unwrap();
    assert!(!stripped.is_nullable());

    let dirty = Column::from_scalars(
        ColumnType::nullable(LogicalType::Int64),
        &[ScalarValue::Null],
    )
    .unwrap();
    assert_eq!(
        dirty.into_non_nullable("k").unwrap_err(),
        BatchError::NullInNonNullable { column: "k".into() }
    );
}

#[test]
fn repeat_builds_constant_column() {
    let column = Column::repeat(
        ColumnType::non_nullable(LogicalType::Utf8),
        &ScalarValue::Utf8("x".into()),
        3,
    )
    .unwrap();
    assert_eq!(column.len(), 3);
    assert_eq!(column.data(), &ColumnData::Utf8(vec!["x".into(); 3]));
}
