use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::engine::core::batch::{BatchColumn, RowBatch, make_nullable};
use crate::engine::core::wal::WalWriter;
use crate::engine::core::write::{AsyncWriter, Submitted, WriterMetrics};
use crate::engine::errors::SinkError;
use crate::engine::schema::SchemaDescriptor;

use super::descriptor::{SinkDescriptor, SourceState};
use super::expr::ExprContext;
use super::metrics::SinkMetrics;
use super::runtime_state::RuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLifecycle {
    Created,
    Initialized,
    Prepared,
    Opened,
    Sinking,
    Closed,
}

impl SinkLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkLifecycle::Created => "created",
            SinkLifecycle::Initialized => "initialized",
            SinkLifecycle::Prepared => "prepared",
            SinkLifecycle::Opened => "opened",
            SinkLifecycle::Sinking => "sinking",
            SinkLifecycle::Closed => "closed",
        }
    }
}

/// Terminal operator of a load pipeline: projects each input batch through the output
/// expressions and hands it to an `AsyncWriter`.
///
/// `sink` never waits for the writer. Batches the writer cannot take yet are kept in an ordered
/// overflow queue, and `can_accept_input` reports false until it is empty again.
pub struct TableSinkOperator {
    input_schema: Arc<SchemaDescriptor>,
    descriptor: Option<SinkDescriptor>,
    exprs: Vec<ExprContext>,
    lifecycle: SinkLifecycle,
    writer: Option<AsyncWriter>,
    group_commit_wal: Option<WalWriter>,
    overflow: VecDeque<RowBatch>,
    first_sink_error: Option<SinkError>,
    close_status: OnceCell<Result<(), SinkError>>,
    metrics: Arc<SinkMetrics>,
}

impl TableSinkOperator {
    pub fn new(input_schema: Arc<SchemaDescriptor>) -> Self {
        Self {
            input_schema,
            descriptor: None,
            exprs: Vec::new(),
            lifecycle: SinkLifecycle::Created,
            writer: None,
            group_commit_wal: None,
            overflow: VecDeque::new(),
            first_sink_error: None,
            close_status: OnceCell::new(),
            metrics: SinkMetrics::new(),
        }
    }

    /// Parses the output expressions. No I/O.
    pub fn init(&mut self, descriptor: &SinkDescriptor) -> Result<(), SinkError> {
        self.expect_state("init", &[SinkLifecycle::Created])?;

        self.exprs = ExprContext::create_all(&descriptor.output_exprs)?;
        self.descriptor = Some(descriptor.clone());
        self.lifecycle = SinkLifecycle::Initialized;

        debug!(
            target: "olap_ingest::table_sink::init",
            table_id = descriptor.table_id, load_id = %descriptor.load_id,
            exprs = self.exprs.len(), group_commit = descriptor.group_commit,
            "Table sink initialized"
        );
        Ok(())
    }

    /// Binds the output expressions against the input schema and checks each result fits
    /// its output slot.
    pub fn prepare(&mut self, state: &RuntimeState) -> Result<(), SinkError> {
        self.expect_state("prepare", &[SinkLifecycle::Initialized])?;
        let descriptor = self.descriptor()?;
        let slots = descriptor.output_schema.slots().to_vec();

        if self.exprs.len() != slots.len() {
            return Err(SinkError::InvalidExpr(format!(
                "{} output expressions for {} output columns",
                self.exprs.len(),
                slots.len()
            )));
        }

        for (expr, slot) in self.exprs.iter_mut().zip(slots.iter()) {
            let result_type = expr.prepare(&self.input_schema)?;
            if result_type.logical != slot.column_type.logical {
                return Err(SinkError::Bind(format!(
                    "expression for '{}' yields {} but the column is {}",
                    slot.name, result_type.logical, slot.column_type.logical
                )));
            }
            if result_type.nullable && !slot.is_nullable() {
                return Err(SinkError::Bind(format!(
                    "expression for non-nullable column '{}' may yield nulls",
                    slot.name
                )));
            }
        }

        self.lifecycle = SinkLifecycle::Prepared;
        debug!(target: "olap_ingest::table_sink::prepare", load_id = state.load_id(), "Table sink prepared");
        Ok(())
    }

    /// Opens the expression evaluators, the group-commit WAL when enabled, and the writer.
    pub async fn open(&mut self, state: &RuntimeState) -> Result<(), SinkError> {
        self.expect_state("open", &[SinkLifecycle::Prepared])?;
        let start = Instant::now();
        let descriptor = self.descriptor()?.clone();

        for expr in self.exprs.iter_mut() {
            expr.open()?;
        }

        if descriptor.group_commit {
            let wal_id = state.wal_id().ok_or_else(|| {
                SinkError::Wal(format!("group commit load {} has no WAL id", descriptor.load_id))
            })?;
            let path = state
                .wal_manager()
                .create_wal_path(wal_id, &descriptor.load_id);
            let wal = WalWriter::create(
                &path,
                &descriptor.output_schema.col_ids(),
                state.wal_options().clone(),
            )?;
            self.group_commit_wal = Some(wal);
        }

        let transport = state.writer_factory().create(&descriptor)?;
        let writer = AsyncWriter::open(
            &descriptor.load_id,
            transport,
            state.writer_options().clone(),
        )
        .await
        .inspect_err(|e| {
            error!(target: "olap_ingest::table_sink::open", load_id = %descriptor.load_id, error = %e, "Failed to open writer");
        })?;
        self.writer = Some(writer);

        self.lifecycle = SinkLifecycle::Opened;
        self.metrics.add_open_time(start.elapsed());
        info!(
            target: "olap_ingest::table_sink::open",
            load_id = %descriptor.load_id, table_id = descriptor.table_id,
            group_commit = descriptor.group_commit,
            "Table sink opened"
        );
        Ok(())
    }

    /// Projects `batch` and forwards it to the writer. A `Finished` source state closes the
    /// operator and returns the close status.
    pub async fn sink(
        &mut self,
        state: &RuntimeState,
        batch: RowBatch,
        source_state: SourceState,
    ) -> Result<(), SinkError> {
        self.expect_state("sink", &[SinkLifecycle::Opened, SinkLifecycle::Sinking])?;
        self.lifecycle = SinkLifecycle::Sinking;

        let start = Instant::now();
        let result = self.sink_batch(batch);
        self.metrics.add_exec_time(start.elapsed());

        if let Err(e) = &result {
            warn!(target: "olap_ingest::table_sink::sink", load_id = state.load_id(), error = %e, "Sink failed");
            self.first_sink_error.get_or_insert_with(|| e.clone());
        }

        if source_state.is_finished() {
            return self.close(state, Ok(())).await;
        }
        result
    }

    fn sink_batch(&mut self, batch: RowBatch) -> Result<(), SinkError> {
        let rows = batch.rows();
        self.metrics.on_input(rows as u64);
        if rows == 0 {
            return Ok(());
        }

        let projected = self.project(&batch)?;
        self.metrics.on_projected(projected.rows() as u64);

        if let Some(wal) = self.group_commit_wal.as_mut() {
            wal.append_batch(&projected)?;
        }

        self.retry_overflow()?;
        if !self.overflow.is_empty() {
            self.overflow.push_back(projected);
            self.metrics.record_backpressure();
            return Ok(());
        }

        let writer = self.writer.as_ref().ok_or(SinkError::InvalidState {
            op: "sink",
            state: self.lifecycle.as_str(),
        })?;
        if let Submitted::Rejected(batch) = writer.submit(projected)? {
            self.overflow.push_back(batch);
            self.metrics.record_backpressure();
        }
        Ok(())
    }

    /// Evaluates every output expression over the whole batch.
    fn project(&self, batch: &RowBatch) -> Result<RowBatch, SinkError> {
        let descriptor = self.descriptor()?;
        let mut projected = RowBatch::new();

        for (expr, slot) in self.exprs.iter().zip(descriptor.output_schema.slots()) {
            let (column, _) = expr.execute(batch)?;
            let column = if slot.is_nullable() {
                make_nullable(column)
            } else if column.is_nullable() {
                Arc::new(Arc::unwrap_or_clone(column).into_non_nullable(&slot.name)?)
            } else {
                column
            };
            projected.push(BatchColumn::new(slot.name.clone(), slot.column_type, column))?;
        }
        Ok(projected)
    }

    /// Hands queued batches to the writer in order until it rejects one.
    fn retry_overflow(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.as_ref() else {
            return Ok(());
        };
        while let Some(batch) = self.overflow.pop_front() {
            if let Submitted::Rejected(batch) = writer.submit(batch)? {
                self.overflow.push_front(batch);
                break;
            }
        }
        Ok(())
    }

    /// Backpressure signal for the scheduler. Retries queued batches first.
    pub fn can_accept_input(&mut self) -> bool {
        if !matches!(
            self.lifecycle,
            SinkLifecycle::Opened | SinkLifecycle::Sinking
        ) {
            return false;
        }
        // A failed writer must not stall the pipeline; the next sink call reports it.
        if self.first_sink_error.is_some() {
            return true;
        }
        if let Some(e) = self.writer.as_ref().and_then(AsyncWriter::first_error) {
            warn!(target: "olap_ingest::table_sink::can_accept_input", error = %e, "Writer failed");
            self.first_sink_error = Some(SinkError::from(e));
            return true;
        }
        if let Err(e) = self.retry_overflow() {
            self.first_sink_error.get_or_insert(e);
            return true;
        }
        self.overflow.is_empty()
            && self
                .writer
                .as_ref()
                .map(AsyncWriter::can_write)
                .unwrap_or(false)
    }

    /// Drains the writer and releases everything. Only the first call does work; its result
    /// is returned by every later call.
    ///
    /// An error in `exec_status` wins over an error seen during `sink`, which wins over the
    /// writer's own status.
    pub async fn close(
        &mut self,
        state: &RuntimeState,
        exec_status: Result<(), SinkError>,
    ) -> Result<(), SinkError> {
        if let Some(status) = self.close_status.get() {
            return status.clone();
        }
        let start = Instant::now();

        let upstream = match exec_status {
            Err(e) => Some(e),
            Ok(()) => self.first_sink_error.clone(),
        };

        let writer_status = match self.writer.as_mut() {
            Some(writer) => {
                let mut flush_status = Ok(());
                if upstream.is_none() {
                    while let Some(batch) = self.overflow.pop_front() {
                        if let Err(e) = writer.submit_blocking(batch).await {
                            flush_status = Err(SinkError::from(e));
                            break;
                        }
                    }
                }
                if !self.overflow.is_empty() {
                    debug!(
                        target: "olap_ingest::table_sink::close",
                        load_id = state.load_id(), dropped = self.overflow.len(),
                        "Dropping queued batches"
                    );
                    self.overflow.clear();
                }

                let drain_input = match &upstream {
                    Some(e) => Err(e.clone()),
                    None => Ok(()),
                };
                let drained = writer
                    .drain_and_close(&drain_input)
                    .await
                    .map_err(SinkError::from);
                drained.and(flush_status)
            }
            None => Ok(()),
        };

        let wal_status = match self.group_commit_wal.take() {
            Some(mut wal) => wal.finalize().map_err(SinkError::from),
            None => Ok(()),
        };

        for expr in self.exprs.iter_mut() {
            expr.close();
        }

        let status = match upstream {
            Some(e) => Err(e),
            None => writer_status.and(wal_status),
        };

        self.lifecycle = SinkLifecycle::Closed;
        self.metrics.add_close_time(start.elapsed());
        match &status {
            Ok(()) => info!(
                target: "olap_ingest::table_sink::close",
                load_id = state.load_id(),
                input_rows = self.metrics.input_rows(),
                "Table sink closed"
            ),
            Err(e) => warn!(
                target: "olap_ingest::table_sink::close",
                load_id = state.load_id(), error = %e,
                "Table sink closed with error"
            ),
        }

        self.close_status.get_or_init(|| status).clone()
    }

    pub fn state(&self) -> SinkLifecycle {
        self.lifecycle
    }

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn writer_metrics(&self) -> Option<Arc<WriterMetrics>> {
        self.writer.as_ref().map(AsyncWriter::metrics)
    }

    pub fn close_status(&self) -> Option<&Result<(), SinkError>> {
        self.close_status.get()
    }

    /// Batches waiting for the writer to make room.
    pub fn queued_batches(&self) -> usize {
        self.overflow.len()
    }

    pub fn expr_contexts(&self) -> &[ExprContext] {
        &self.exprs
    }

    fn descriptor(&self) -> Result<&SinkDescriptor, SinkError> {
        self.descriptor.as_ref().ok_or(SinkError::InvalidState {
            op: "use descriptor",
            state: self.lifecycle.as_str(),
        })
    }

    fn expect_state(&self, op: &'static str, allowed: &[SinkLifecycle]) -> Result<(), SinkError> {
        if allowed.contains(&self.lifecycle) {
            Ok(())
        } else {
            Err(SinkError::InvalidState {
                op,
                state: self.lifecycle.as_str(),
            })
        }
    }
}
