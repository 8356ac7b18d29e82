use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::service::{PotentialError, PotentialService};
use crate::table::ScoreTable;

/// HTTP endpoints for roster classification and applicant merge.
///
/// `/process` and `/process_daftar` are path aliases of the classify and applicant routes.
/// Every endpoint reads a raw CSV request body; multipart spreadsheet uploads are not accepted.
pub fn potential_router(service: Arc<PotentialService>) -> Router {
    Router::new()
        .route("/api/v1/potential/classify", post(classify_handler))
        .route("/api/v1/potential/applicants", post(applicants_handler))
        .route("/api/v1/potential/roster", get(roster_handler))
        .route("/process", post(classify_handler))
        .route("/process_daftar", post(applicants_handler))
        .with_state(service)
}

pub(crate) async fn classify_handler(
    State(service): State<Arc<PotentialService>>,
    body: String,
) -> Result<Json<ScoreTable>, PotentialError> {
    let outcome = service.classify(body.as_bytes())?;
    Ok(Json(outcome.rows))
}

pub(crate) async fn applicants_handler(
    State(service): State<Arc<PotentialService>>,
    body: String,
) -> Result<Json<ScoreTable>, PotentialError> {
    let merged = service.join_applicants(body.as_bytes())?;
    Ok(Json(merged))
}

pub(crate) async fn roster_handler(State(service): State<Arc<PotentialService>>) -> Response {
    match service.roster_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref())],
            csv,
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
