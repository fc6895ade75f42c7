use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::schema::SchemaDescriptor;

use super::expr::ExprDef;

/// Everything the planner hands to a table sink: where rows go, what they look like and how
/// each output column is computed from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkDescriptor {
    pub table_id: i64,
    pub load_id: String,
    pub output_schema: SchemaDescriptor,
    pub output_exprs: Vec<ExprDef>,
    #[serde(default)]
    pub group_commit: bool,
}

impl SinkDescriptor {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Same load writing through the plain path, as used when replaying a group-commit WAL.
    pub fn without_group_commit(&self) -> Self {
        Self {
            group_commit: false,
            ..self.clone()
        }
    }
}

/// What the upstream operator says about its remaining input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    MoreData,
    Finished,
}

impl SourceState {
    pub fn is_finished(&self) -> bool {
        matches!(self, SourceState::Finished)
    }
}
