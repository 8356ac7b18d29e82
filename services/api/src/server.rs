use crate::cli::ServeArgs;
use crate::infra::{open_snapshots, potential_service, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use spk_mahasiswa::config::AppConfig;
use spk_mahasiswa::error::AppError;
use spk_mahasiswa::telemetry;
use spk_mahasiswa::workflows::saw::{HttpCriteriaGateway, SawError, SawService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let snapshots = open_snapshots(&config)?;
    let potential = potential_service(&config, Arc::clone(&snapshots))?;

    let gateway = Arc::new(HttpCriteriaGateway::new(&config.criteria).map_err(SawError::from)?);
    let saw = Arc::new(SawService::new(
        Arc::clone(&gateway),
        gateway,
        snapshots,
        config.saw.score_scope,
    ));

    let app = with_service_routes(potential, saw)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        criteria = %config.criteria.base_url,
        data_dir = %config.storage.data_dir.display(),
        "student potential service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
