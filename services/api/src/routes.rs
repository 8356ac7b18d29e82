use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use spk_mahasiswa::workflows::potential::{potential_router, PotentialService};
use spk_mahasiswa::workflows::saw::{saw_router, CriteriaSource, ResultSink, SawService};
use std::sync::Arc;

pub(crate) fn with_service_routes<C, S>(
    potential: Arc<PotentialService>,
    saw: Arc<SawService<C, S>>,
) -> Router
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    potential_router(potential)
        .merge(saw_router(saw))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Acquire);
    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use spk_mahasiswa::snapshot::SnapshotStore;
    use spk_mahasiswa::workflows::potential::{
        ClusterModel, FeatureScaler, PotentialClassifier, FEATURE_COUNT,
    };
    use spk_mahasiswa::workflows::saw::{FileCriteriaSource, LocalOnlySink, ScoreScope};
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct Passthrough;

    impl FeatureScaler for Passthrough {
        fn transform(&self, features: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
            features
        }
    }

    #[derive(Debug)]
    struct AlwaysFirst;

    impl ClusterModel for AlwaysFirst {
        fn predict(&self, _features: [f64; FEATURE_COUNT]) -> usize {
            0
        }
    }

    fn app(dir: &std::path::Path, ready: bool) -> Router {
        let snapshots = Arc::new(SnapshotStore::open(dir.join("data")).expect("store opens"));
        let classifier = PotentialClassifier::new(Arc::new(Passthrough), Arc::new(AlwaysFirst));
        let potential = Arc::new(PotentialService::new(
            Arc::new(classifier),
            Arc::clone(&snapshots),
        ));

        let criteria_path = dir.join("criteria.json");
        std::fs::write(
            &criteria_path,
            r#"[{"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": 1}]"#,
        )
        .expect("write criteria");
        let saw = Arc::new(SawService::new(
            Arc::new(FileCriteriaSource::new(criteria_path)),
            Arc::new(LocalOnlySink),
            snapshots,
            ScoreScope::Criteria,
        ));

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_service_routes(potential, saw).layer(Extension(state))
    }

    async fn read_json_body(body: Body) -> serde_json::Value {
        let bytes = axum::body::to_bytes(body, 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_and_readiness_report_state() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = app(dir.path(), false)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(dir.path(), false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json_body(response.into_body()).await["status"], "initializing");

        let response = app(dir.path(), true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn classify_then_rank_through_merged_router() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = "NPM,Nama Mahasiswa,Algoritma,Statistika,Nilai Project,Kedisiplinan Akademik,Keaktifan\n\
                      123,Sari,A,C,85,90,88\n";

        let response = app(dir.path(), true)
            .oneshot(
                Request::post("/api/v1/potential/classify")
                    .body(Body::from(roster))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let rows = read_json_body(response.into_body()).await;
        assert_eq!(rows[0]["Cluster"], 3);
        assert_eq!(rows[0]["Label Cluster"], "Potensi Sedang");

        let response = app(dir.path(), true)
            .oneshot(
                Request::post("/api/v1/saw/rank")
                    .body(Body::from("NPM,Akademik_IPK\n1,0.5\n2,1\n"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let rows = read_json_body(response.into_body()).await;
        assert_eq!(rows[0]["Rank"], 2);
        assert_eq!(rows[1]["Rank"], 1);
        assert_eq!(rows[1]["SAW_Score"], 1);
    }

    #[tokio::test]
    async fn join_without_roster_snapshot_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let response = app(dir.path(), true)
            .oneshot(
                Request::post("/api/v1/potential/applicants")
                    .body(Body::from("NPM,Nama Mahasiswa\n123,Sari\n"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            read_json_body(response.into_body()).await["kind"],
            "snapshot_missing"
        );
    }
}
