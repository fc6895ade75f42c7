use std::sync::Arc;

use crate::engine::schema::{SchemaDescriptor, SlotDescriptor};
use crate::engine::types::{ColumnType, LogicalType};

/// Builds schema descriptors slot by slot.
pub struct SchemaFactory {
    slots: Vec<SlotDescriptor>,
}

impl SchemaFactory {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_slot(mut self, col_id: i32, name: &str, logical: LogicalType, nullable: bool) -> Self {
        self.slots.push(SlotDescriptor::new(
            col_id,
            name,
            ColumnType {
                logical,
                nullable,
            },
        ));
        self
    }

    pub fn with_int64(self, col_id: i32, name: &str) -> Self {
        self.with_slot(col_id, name, LogicalType::Int64, false)
    }

    pub fn with_nullable_int64(self, col_id: i32, name: &str) -> Self {
        self.with_slot(col_id, name, LogicalType::Int64, true)
    }

    pub fn with_utf8(self, col_id: i32, name: &str) -> Self {
        self.with_slot(col_id, name, LogicalType::Utf8, false)
    }

    pub fn with_nullable_utf8(self, col_id: i32, name: &str) -> Self {
        self.with_slot(col_id, name, LogicalType::Utf8, true)
    }

    pub fn create(self) -> SchemaDescriptor {
        SchemaDescriptor::new(self.slots).expect("test schema has duplicate column ids")
    }

    pub fn create_arc(self) -> Arc<SchemaDescriptor> {
        Arc::new(self.create())
    }
}
