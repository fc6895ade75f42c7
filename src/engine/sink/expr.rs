use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::core::batch::{Column, ColumnRef, RowBatch};
use crate::engine::errors::SinkError;
use crate::engine::schema::SchemaDescriptor;
use crate::engine::types::{ColumnType, LogicalType, ScalarValue};

/// Serialized definition of one output expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprDef {
    /// The input column with this column ID.
    SlotRef { slot_id: i32 },
    Literal {
        value: ScalarValue,
        logical_type: LogicalType,
    },
    Cast {
        child: Box<ExprDef>,
        target: LogicalType,
    },
}

impl ExprDef {
    pub fn slot_ref(slot_id: i32) -> Self {
        ExprDef::SlotRef { slot_id }
    }

    pub fn literal(value: ScalarValue, logical_type: LogicalType) -> Self {
        ExprDef::Literal {
            value,
            logical_type,
        }
    }

    pub fn cast(child: ExprDef, target: LogicalType) -> Self {
        ExprDef::Cast {
            child: Box::new(child),
            target,
        }
    }
}

pub fn cast_supported(from: LogicalType, to: LogicalType) -> bool {
    from == to
        || from == LogicalType::Utf8
        || to == LogicalType::Utf8
        || (from.is_numeric() && to.is_numeric())
        || matches!(
            (from, to),
            (LogicalType::Boolean, LogicalType::Int64) | (LogicalType::Int64, LogicalType::Boolean)
        )
}

#[derive(Debug, Clone)]
enum BoundExpr {
    Column {
        position: usize,
        column_type: ColumnType,
    },
    Literal {
        value: ScalarValue,
        column_type: ColumnType,
    },
    Cast {
        child: Box<BoundExpr>,
        column_type: ColumnType,
    },
}

impl BoundExpr {
    fn column_type(&self) -> ColumnType {
        match self {
            BoundExpr::Column { column_type, .. }
            | BoundExpr::Literal { column_type, .. }
            | BoundExpr::Cast { column_type, .. } => *column_type,
        }
    }

    fn bind(def: &ExprDef, input: &SchemaDescriptor) -> Result<Self, SinkError> {
        match def {
            ExprDef::SlotRef { slot_id } => {
                let position = input.position_of(*slot_id).ok_or_else(|| {
                    SinkError::Bind(format!("input has no column with id {}", slot_id))
                })?;
                Ok(BoundExpr::Column {
                    position,
                    column_type: input.slots()[position].column_type,
                })
            }
            ExprDef::Literal {
                value,
                logical_type,
            } => {
                let value = value
                    .cast_to(*logical_type)
                    .map_err(SinkError::InvalidExpr)?;
                let column_type = ColumnType {
                    logical: *logical_type,
                    nullable: value.is_null(),
                };
                Ok(BoundExpr::Literal { value, column_type })
            }
            ExprDef::Cast { child, target } => {
                let child = BoundExpr::bind(child, input)?;
                let from = child.column_type();
                if !cast_supported(from.logical, *target) {
                    return Err(SinkError::Bind(format!(
                        "cannot cast {} to {}",
                        from.logical, target
                    )));
                }
                Ok(BoundExpr::Cast {
                    child: Box::new(child),
                    column_type: ColumnType {
                        logical: *target,
                        nullable: from.nullable,
                    },
                })
            }
        }
    }

    fn evaluate(&self, batch: &RowBatch) -> Result<ColumnRef, SinkError> {
        match self {
            BoundExpr::Column {
                position,
                column_type,
            } => {
                let column = &batch.get_by_position(*position)?.column;
                if column.logical_type() != column_type.logical {
                    return Err(SinkError::Eval(format!(
                        "input column {} is {} but was bound as {}",
                        position,
                        column.logical_type(),
                        column_type.logical
                    )));
                }
                Ok(Arc::clone(column))
            }
            BoundExpr::Literal { value, column_type } => {
                Ok(Arc::new(Column::repeat(*column_type, value, batch.rows())?))
            }
            BoundExpr::Cast { child, column_type } => {
                let input = child.evaluate(batch)?;
                if input.logical_type() == column_type.logical {
                    return Ok(input);
                }
                let values = input
                    .values()
                    .iter()
                    .map(|v| v.cast_to(column_type.logical))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(SinkError::Eval)?;
                let cast_type = ColumnType {
                    logical: column_type.logical,
                    nullable: input.is_nullable(),
                };
                Ok(Arc::new(Column::from_scalars(cast_type, &values)?))
            }
        }
    }
}

/// Evaluator for one output expression: `create`, then `prepare` against the input schema,
/// `open`, any number of `execute`, `close`.
#[derive(Debug)]
pub struct ExprContext {
    def: ExprDef,
    bound: Option<BoundExpr>,
    opened: bool,
    closed: bool,
}

impl ExprContext {
    /// Checks the definition itself; nothing is resolved against a schema yet.
    pub fn create(def: &ExprDef) -> Result<Self, SinkError> {
        validate(def)?;
        Ok(Self {
            def: def.clone(),
            bound: None,
            opened: false,
            closed: false,
        })
    }

    pub fn create_all(defs: &[ExprDef]) -> Result<Vec<Self>, SinkError> {
        defs.iter().map(Self::create).collect()
    }

    pub fn definition(&self) -> &ExprDef {
        &self.def
    }

    /// Binds column references by column ID and returns the result type.
    pub fn prepare(&mut self, input: &SchemaDescriptor) -> Result<ColumnType, SinkError> {
        if self.closed {
            return Err(SinkError::Bind("expression context is closed".into()));
        }
        let bound = BoundExpr::bind(&self.def, input)?;
        let column_type = bound.column_type();
        self.bound = Some(bound);
        Ok(column_type)
    }

    pub fn result_type(&self) -> Option<ColumnType> {
        self.bound.as_ref().map(BoundExpr::column_type)
    }

    pub fn open(&mut self) -> Result<(), SinkError> {
        if self.bound.is_none() || self.closed {
            return Err(SinkError::Bind(
                "expression must be prepared before open".into(),
            ));
        }
        self.opened = true;
        Ok(())
    }

    /// Evaluates the expression over every row of `batch`, preserving row order.
    pub fn execute(&self, batch: &RowBatch) -> Result<(ColumnRef, ColumnType), SinkError> {
        let bound = match (&self.bound, self.opened && !self.closed) {
            (Some(bound), true) => bound,
            _ => return Err(SinkError::Eval("expression context is not open".into())),
        };
        let column = bound.evaluate(batch)?;
        let column_type = column.column_type();
        Ok((column, column_type))
    }

    /// Releases the bound tree. Later calls are no-ops.
    pub fn close(&mut self) {
        self.closed = true;
        self.opened = false;
        self.bound = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn validate(def: &ExprDef) -> Result<(), SinkError> {
    match def {
        ExprDef::SlotRef { .. } => Ok(()),
        ExprDef::Literal {
            value,
            logical_type,
        } => {
            let matches = value
                .logical_type()
                .map(|t| t == *logical_type || (t.is_numeric() && logical_type.is_numeric()))
                .unwrap_or(true);
            if matches {
                Ok(())
            } else {
                Err(SinkError::InvalidExpr(format!(
                    "literal {} is not a {}",
                    value, logical_type
                )))
            }
        }
        ExprDef::Cast { child, .. } => validate(child),
    }
}
