use crate::engine::schema::SchemaDescriptor;
use crate::engine::sink::{ExprDef, SinkDescriptor};
use crate::test_helpers::factories::SchemaFactory;

/// Defaults to two output columns, `id` (Int64, id 1) and `name` (nullable Utf8, id 2), fed by
/// slot refs of the same ids.
pub struct SinkDescriptorFactory {
    table_id: i64,
    load_id: String,
    output_schema: SchemaDescriptor,
    output_exprs: Option<Vec<ExprDef>>,
    group_commit: bool,
}

impl SinkDescriptorFactory {
    pub fn new() -> Self {
        Self {
            table_id: 1001,
            load_id: "load-1".to_string(),
            output_schema: SchemaFactory::new()
                .with_int64(1, "id")
                .with_nullable_utf8(2, "name")
                .create(),
            output_exprs: None,
            group_commit: false,
        }
    }

    pub fn with_table_id(mut self, table_id: i64) -> Self {
        self.table_id = table_id;
        self
    }

    pub fn with_load_id(mut self, load_id: &str) -> Self {
        self.load_id = load_id.to_string();
        self
    }

    pub fn with_output_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.output_schema = schema;
        self
    }

    pub fn with_exprs(mut self, exprs: Vec<ExprDef>) -> Self {
        self.output_exprs = Some(exprs);
        self
    }

    pub fn with_group_commit(mut self, group_commit: bool) -> Self {
        self.group_commit = group_commit;
        self
    }

    pub fn create(self) -> SinkDescriptor {
        let output_exprs = self.output_exprs.unwrap_or_else(|| {
            self.output_schema
                .col_ids()
                .into_iter()
                .map(ExprDef::slot_ref)
                .collect()
        });
        SinkDescriptor {
            table_id: self.table_id,
            load_id: self.load_id,
            output_schema: self.output_schema,
            output_exprs,
            group_commit: self.group_commit,
        }
    }
}
