use metrics_exporter_prometheus::PrometheusHandle;
use spk_mahasiswa::config::AppConfig;
use spk_mahasiswa::error::AppError;
use spk_mahasiswa::snapshot::SnapshotStore;
use spk_mahasiswa::workflows::potential::{PotentialClassifier, PotentialService};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn open_snapshots(config: &AppConfig) -> Result<Arc<SnapshotStore>, AppError> {
    Ok(Arc::new(SnapshotStore::open(&config.storage.data_dir)?))
}

/// Classification service backed by the configured model artifacts. Fails when either
/// artifact is missing or invalid.
pub(crate) fn potential_service(
    config: &AppConfig,
    snapshots: Arc<SnapshotStore>,
) -> Result<Arc<PotentialService>, AppError> {
    let classifier = PotentialClassifier::load(&config.model)?;
    Ok(Arc::new(PotentialService::new(Arc::new(classifier), snapshots)))
}
