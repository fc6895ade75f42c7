use std::collections::HashMap;

use crate::engine::errors::WalError;

/// Column ID -> position of that column in the blocks stored in one WAL file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPositionMap {
    positions: HashMap<i32, usize>,
    col_ids: Vec<i32>,
}

impl ColumnPositionMap {
    /// Parses the header text: comma-separated decimal column IDs in write-time order.
    /// Empty and whitespace-only tokens are skipped; the rest are trimmed.
    pub fn parse(header: &str) -> Result<Self, WalError> {
        let mut map = Self::default();

        for raw in header.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }

            let col_id = token.parse::<i32>().map_err(|_| WalError::InvalidToken {
                token: token.to_string(),
            })?;

            let position = map.col_ids.len();
            if map.positions.insert(col_id, position).is_some() {
                return Err(WalError::DuplicateColumnId { col_id });
            }
            map.col_ids.push(col_id);
        }

        Ok(map)
    }

    pub fn from_col_ids(col_ids: &[i32]) -> Result<Self, WalError> {
        Self::parse(&to_header(col_ids))
    }

    pub fn position(&self, col_id: i32) -> Option<usize> {
        self.positions.get(&col_id).copied()
    }

    pub fn len(&self) -> usize {
        self.col_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.col_ids.is_empty()
    }

    /// Column IDs in header order.
    pub fn col_ids(&self) -> &[i32] {
        &self.col_ids
    }
}

/// Renders column IDs the way the WAL header stores them.
pub fn to_header(col_ids: &[i32]) -> String {
    col_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
