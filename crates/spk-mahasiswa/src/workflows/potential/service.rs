use std::io::Read;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::info;

use super::classifier::PotentialClassifier;
use super::join::{merge_applicants, JoinError};
use super::roster::{classify_roster, RosterError};
use crate::error::{error_response, ErrorKind};
use crate::snapshot::{SnapshotError, SnapshotKind, SnapshotReceipt, SnapshotStore};
use crate::table::ScoreTable;

/// Classification and applicant merge over the shared classified-roster snapshot.
#[derive(Debug, Clone)]
pub struct PotentialService {
    classifier: Arc<PotentialClassifier>,
    snapshots: Arc<SnapshotStore>,
}

/// Classified rows plus the snapshot they were published to.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationOutcome {
    pub rows: ScoreTable,
    pub snapshot: SnapshotReceipt,
}

impl PotentialService {
    pub fn new(classifier: Arc<PotentialClassifier>, snapshots: Arc<SnapshotStore>) -> Self {
        Self {
            classifier,
            snapshots,
        }
    }

    /// Classify an uploaded roster and replace the classified-roster snapshot.
    pub fn classify<R: Read>(&self, roster: R) -> Result<ClassificationOutcome, PotentialError> {
        let table = ScoreTable::from_reader(roster).map_err(RosterError::from)?;
        let classified = classify_roster(table, &self.classifier)?;
        let snapshot = self
            .snapshots
            .write(SnapshotKind::ClassifiedRoster, &classified.table)?;

        info!(
            students = classified.students.len(),
            path = %snapshot.path.display(),
            "roster classified"
        );

        Ok(ClassificationOutcome {
            rows: classified.table,
            snapshot,
        })
    }

    /// Merge an applicant list with the most recent classified roster.
    pub fn join_applicants<R: Read>(&self, applicants: R) -> Result<ScoreTable, PotentialError> {
        let applicants = ScoreTable::from_reader(applicants).map_err(JoinError::from)?;
        let roster = self.snapshots.read(SnapshotKind::ClassifiedRoster)?;
        let merged = merge_applicants(&applicants, &roster)?;

        info!(applicants = merged.len(), "applicants merged with roster");
        Ok(merged)
    }

    /// Raw CSV of the classified-roster snapshot.
    pub fn roster_csv(&self) -> Result<Vec<u8>, PotentialError> {
        Ok(self.snapshots.read_bytes(SnapshotKind::ClassifiedRoster)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PotentialError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl PotentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PotentialError::Roster(RosterError::DuplicateKey(_))
            | PotentialError::Join(JoinError::DuplicateKey(_)) => ErrorKind::DuplicateKey,
            PotentialError::Roster(RosterError::UnknownCluster(_)) => ErrorKind::ModelUnavailable,
            PotentialError::Roster(_) | PotentialError::Join(JoinError::Table(_)) => {
                ErrorKind::InputFormat
            }
            PotentialError::Snapshot(error) => error.kind(),
        }
    }
}

impl IntoResponse for PotentialError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string())
    }
}

