use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::engine::types::ColumnType;

/// One output column: a stable column ID, a display name and its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub col_unique_id: i32,
    pub name: String,
    pub column_type: ColumnType,
}

impl SlotDescriptor {
    pub fn new<S: Into<String>>(col_unique_id: i32, name: S, column_type: ColumnType) -> Self {
        Self {
            col_unique_id,
            name: name.into(),
            column_type,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.column_type.nullable
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Duplicate column id {col_id} (slots '{first}' and '{second}')")]
    DuplicateColumnId {
        col_id: i32,
        first: String,
        second: String,
    },
}

/// Ordered slot list. Column IDs are unique within a descriptor; lookups by ID are O(1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescriptor {
    slots: Vec<SlotDescriptor>,
    #[serde(skip)]
    by_col_id: HashMap<i32, usize>,
}

impl SchemaDescriptor {
    pub fn new(slots: Vec<SlotDescriptor>) -> Result<Self, SchemaError> {
        let mut by_col_id = HashMap::with_capacity(slots.len());
        for (pos, slot) in slots.iter().enumerate() {
            if let Some(prev) = by_col_id.insert(slot.col_unique_id, pos) {
                return Err(SchemaError::DuplicateColumnId {
                    col_id: slot.col_unique_id,
                    first: slots[prev].name.clone(),
                    second: slot.name.clone(),
                });
            }
        }
        Ok(Self { slots, by_col_id })
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn position_of(&self, col_id: i32) -> Option<usize> {
        self.by_col_id.get(&col_id).copied()
    }

    pub fn find_by_col_id(&self, col_id: i32) -> Option<&SlotDescriptor> {
        self.position_of(col_id).map(|pos| &self.slots[pos])
    }

    pub fn col_ids(&self) -> Vec<i32> {
        self.slots.iter().map(|s| s.col_unique_id).collect()
    }
}

impl<'de> Deserialize<'de> for SchemaDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            slots: Vec<SlotDescriptor>,
        }

        let raw = Raw::deserialize(deserializer)?;
        SchemaDescriptor::new(raw.slots).map_err(serde::de::Error::custom)
    }
}
