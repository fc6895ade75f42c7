use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::core::batch::RowBatch;
use crate::engine::core::wal::WalReader;
use crate::engine::errors::{SinkError, WalError};
use crate::engine::schema::SchemaDescriptor;
use crate::engine::sink::{RuntimeState, SinkDescriptor, SourceState, TableSinkOperator};
use crate::shared::config::CONFIG;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub batches: u64,
    pub rows: u64,
}

/// Resumes a group-commit load: reads the load's WAL back and pushes every batch through a
/// plain table sink.
pub struct WalReplayer {
    state: RuntimeState,
    descriptor: SinkDescriptor,
    source_schema: Arc<SchemaDescriptor>,
    delete_on_success: bool,
    backoff: Duration,
}

impl WalReplayer {
    /// `source_schema` is the shape batches are read in; it is also the sink's input schema.
    pub fn new(
        state: RuntimeState,
        descriptor: SinkDescriptor,
        source_schema: Arc<SchemaDescriptor>,
    ) -> Self {
        Self {
            state,
            descriptor,
            source_schema,
            delete_on_success: false,
            backoff: Duration::from_millis(5),
        }
    }

    pub fn with_configured_options(self) -> Self {
        self.with_delete_on_success(CONFIG.replay.delete_on_success)
            .with_backoff(Duration::from_millis(CONFIG.replay.backoff_ms))
    }

    pub fn with_delete_on_success(mut self, delete: bool) -> Self {
        self.delete_on_success = delete;
        self
    }

    /// Pause between polls while the sink reports backpressure.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn replay(&self) -> Result<ReplayStats, SinkError> {
        let wal_id = self.state.wal_id().ok_or(SinkError::InvalidState {
            op: "replay",
            state: "without a WAL id",
        })?;
        let descriptor = self.descriptor.without_group_commit();

        let mut operator = TableSinkOperator::new(Arc::clone(&self.source_schema));
        if let Err(e) = self.open_operator(&mut operator, &descriptor).await {
            let _ = operator.close(&self.state, Err(e.clone())).await;
            return Err(into_recovery(wal_id, e));
        }

        let mut reader = WalReader::new(wal_id, Arc::clone(self.state.wal_manager()));
        let outcome = self.pump(wal_id, &mut reader, &mut operator).await;
        reader.finalize();

        let exec_status = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        let close_status = operator.close(&self.state, exec_status).await;

        let stats = match (outcome, close_status) {
            (Ok(stats), Ok(())) => stats,
            (Err(e), _) | (Ok(_), Err(e)) => {
                warn!(
                    target: "olap_ingest::wal_replay::replay",
                    wal_id, load_id = %descriptor.load_id, error = %e,
                    "WAL replay failed"
                );
                return Err(into_recovery(wal_id, e));
            }
        };

        info!(
            target: "olap_ingest::wal_replay::replay",
            wal_id, load_id = %descriptor.load_id, batches = stats.batches, rows = stats.rows,
            "WAL replay complete"
        );

        if self.delete_on_success {
            if let Err(e) = self.state.wal_manager().delete_wal(wal_id) {
                warn!(target: "olap_ingest::wal_replay::replay", wal_id, error = %e, "Failed to delete replayed WAL");
            }
        }
        Ok(stats)
    }

    async fn open_operator(
        &self,
        operator: &mut TableSinkOperator,
        descriptor: &SinkDescriptor,
    ) -> Result<(), SinkError> {
        operator.init(descriptor)?;
        operator.prepare(&self.state)?;
        operator.open(&self.state).await
    }

    async fn pump(
        &self,
        wal_id: i64,
        reader: &mut WalReader,
        operator: &mut TableSinkOperator,
    ) -> Result<ReplayStats, SinkError> {
        let recovery = |e: WalError| SinkError::Recovery {
            wal_id,
            reason: e.to_string(),
        };

        reader
            .init(Arc::clone(&self.source_schema))
            .map_err(recovery)?;
        reader.load_header().map_err(recovery)?;

        let mut stats = ReplayStats::default();
        loop {
            let mut batch = RowBatch::empty_for(&self.source_schema);
            let (rows, eof) = reader.next_batch(&mut batch).map_err(recovery)?;
            if eof {
                break;
            }

            while !operator.can_accept_input() {
                tokio::time::sleep(self.backoff).await;
            }
            operator
                .sink(&self.state, batch, SourceState::MoreData)
                .await?;

            stats.batches += 1;
            stats.rows += rows as u64;
        }
        Ok(stats)
    }
}

/// Every failure while replaying is a recovery failure, whatever layer raised it.
fn into_recovery(wal_id: i64, err: SinkError) -> SinkError {
    if err.is_recovery() {
        return err;
    }
    SinkError::Recovery {
        wal_id,
        reason: err.to_string(),
    }
}
