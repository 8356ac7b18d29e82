//! Criteria-driven normalization and Simple Additive Weighting ranking.

pub mod criteria;
pub mod gateway;
pub mod normalizer;
pub mod ranker;
pub mod router;
pub mod service;

pub use criteria::{CriteriaError, CriteriaRegistry, CriterionPayload, CriterionSpec, Direction};
pub use gateway::{
    CriteriaSource, FileCriteriaSource, GatewayError, HttpCriteriaGateway, LocalOnlySink,
    ResultKind, ResultSink,
};
pub use normalizer::{normalize, NormalizeError};
pub use ranker::{competition_ranks, rank, COL_RANK, COL_SAW_SCORE};
pub use router::saw_router;
pub use service::{SawError, SawService, ScoringOutcome};

/// Which columns contribute to `SAW_Score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreScope {
    /// Only the weighted criterion columns.
    #[default]
    Criteria,
    /// Every numeric cell in the row, identifiers included.
    Row,
}

impl ScoreScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "criteria" => Some(ScoreScope::Criteria),
            "row" => Some(ScoreScope::Row),
            _ => None,
        }
    }
}
