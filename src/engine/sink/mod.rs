mod descriptor;
pub mod expr;
mod metrics;
mod operator;
mod runtime_state;

pub use descriptor::{SinkDescriptor, SourceState};
pub use expr::{ExprContext, ExprDef};
pub use metrics::SinkMetrics;
pub use operator::{SinkLifecycle, TableSinkOperator};
pub use runtime_state::RuntimeState;
