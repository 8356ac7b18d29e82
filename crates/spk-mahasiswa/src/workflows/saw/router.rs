use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use super::gateway::{CriteriaSource, ResultSink};
use super::service::{SawError, SawService};
use crate::table::ScoreTable;

/// HTTP endpoints for criteria normalization and SAW ranking. Bodies are raw CSV.
pub fn saw_router<C, S>(service: Arc<SawService<C, S>>) -> Router
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    Router::new()
        .route("/api/v1/saw/normalize", post(normalize_handler::<C, S>))
        .route("/api/v1/saw/rank", post(rank_handler::<C, S>))
        .with_state(service)
}

async fn normalize_handler<C, S>(
    State(service): State<Arc<SawService<C, S>>>,
    body: String,
) -> Result<Json<ScoreTable>, SawError>
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    let outcome = service.normalize(body.as_bytes()).await?;
    Ok(Json(outcome.rows))
}

async fn rank_handler<C, S>(
    State(service): State<Arc<SawService<C, S>>>,
    body: String,
) -> Result<Json<ScoreTable>, SawError>
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    let outcome = service.rank(body.as_bytes()).await?;
    Ok(Json(outcome.rows))
}
