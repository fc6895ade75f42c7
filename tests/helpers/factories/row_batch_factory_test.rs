use crate::engine::types::{LogicalType, ScalarValue};
use crate::test_helpers::factories::RowBatchFactory;

#[test]
fn creates_batch_with_typed_columns() {
    let batch = RowBatchFactory::new()
        .with_int64("id", vec![1, 2])
        .with_nullable_utf8("name", vec![Some("a"), None])
        .create();

    assert_eq!(batch.rows(), 2);
    assert_eq!(batch.column_count(), 2);
    let name = &batch.get_by_position(1).unwrap().column;
    assert!(name.is_nullable());
    assert_eq!(name.logical_type(), LogicalType::Utf8);
    assert_eq!(name.value(1).unwrap(), ScalarValue::Null);
}

#[test]
fn sequential_builds_id_and_name_columns() {
    let batch = RowBatchFactory::new().sequential(10, 3).create();

    assert_eq!(batch.rows(), 3);
    assert_eq!(
        batch.row(2).unwrap(),
        vec![ScalarValue::Int64(12), ScalarValue::Utf8("name-12".into())]
    );
}
