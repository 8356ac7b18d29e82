use std::io::Read;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{info, warn};

use super::criteria::CriteriaRegistry;
use super::gateway::{CriteriaSource, GatewayError, ResultKind, ResultSink};
use super::normalizer::{normalize, NormalizeError};
use super::ranker::rank;
use super::ScoreScope;
use crate::error::{error_response, ErrorKind};
use crate::snapshot::{SnapshotError, SnapshotKind, SnapshotReceipt, SnapshotStore};
use crate::table::{ScoreTable, TableError};

/// Normalization and SAW ranking against criteria fetched per request.
pub struct SawService<C, S> {
    criteria: Arc<C>,
    sink: Arc<S>,
    snapshots: Arc<SnapshotStore>,
    scope: ScoreScope,
}

/// Result rows, the criterion columns that were transformed, and the published snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringOutcome {
    pub rows: ScoreTable,
    pub criteria_columns: Vec<String>,
    pub snapshot: SnapshotReceipt,
}

impl<C, S> SawService<C, S>
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    pub fn new(
        criteria: Arc<C>,
        sink: Arc<S>,
        snapshots: Arc<SnapshotStore>,
        scope: ScoreScope,
    ) -> Self {
        Self {
            criteria,
            sink,
            snapshots,
            scope,
        }
    }

    /// Rescale criterion columns, publish `normalized_data.csv`, then forward downstream.
    pub async fn normalize<R: Read + Send>(&self, scores: R) -> Result<ScoringOutcome, SawError> {
        let mut table = ScoreTable::from_reader(scores)?;
        let registry = self.fetch_criteria().await?;

        let criteria_columns = normalize(&mut table, &registry)?;
        let snapshot = self
            .snapshots
            .write(SnapshotKind::NormalizedScores, &table)?;
        self.forward(ResultKind::Normalized, &table).await?;

        info!(
            rows = table.len(),
            columns = criteria_columns.len(),
            path = %snapshot.path.display(),
            "scores normalized"
        );

        Ok(ScoringOutcome {
            rows: table,
            criteria_columns,
            snapshot,
        })
    }

    /// Weight, score and rank normalized rows, publish `saw_results.csv`, then forward downstream.
    pub async fn rank<R: Read + Send>(&self, normalized: R) -> Result<ScoringOutcome, SawError> {
        let mut table = ScoreTable::from_reader(normalized)?;
        let registry = self.fetch_criteria().await?;

        let criteria_columns = rank(&mut table, &registry, self.scope)?;
        let snapshot = self.snapshots.write(SnapshotKind::SawResults, &table)?;
        self.forward(ResultKind::SawResults, &table).await?;

        info!(
            rows = table.len(),
            columns = criteria_columns.len(),
            scope = ?self.scope,
            path = %snapshot.path.display(),
            "saw ranking complete"
        );

        Ok(ScoringOutcome {
            rows: table,
            criteria_columns,
            snapshot,
        })
    }

    async fn fetch_criteria(&self) -> Result<CriteriaRegistry, SawError> {
        self.criteria.fetch().await.map_err(|err| {
            warn!(error = %err, "criteria fetch failed");
            SawError::Gateway(err)
        })
    }

    async fn forward(&self, kind: ResultKind, table: &ScoreTable) -> Result<(), SawError> {
        self.sink.store(kind, table).await.map_err(|err| {
            warn!(endpoint = kind.endpoint(), error = %err, "downstream store failed");
            SawError::Gateway(err)
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SawError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl SawError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SawError::Table(_) | SawError::Normalize(_) => ErrorKind::InputFormat,
            SawError::Gateway(err) => err.kind(),
            SawError::Snapshot(err) => err.kind(),
        }
    }
}

impl IntoResponse for SawError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string())
    }
}
