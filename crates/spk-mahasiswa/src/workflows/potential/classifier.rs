use std::sync::Arc;

use tracing::info;

use super::model::{
    ClusterModel, FeatureScaler, FeatureVector, KMeansModel, ModelError, StandardScaler,
};
use super::tier::{tier_for_cluster, PotentialTier, TIER_MAPPING_VERSION};
use crate::config::ModelConfig;

/// The clustering model returned an id outside the pinned tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("clustering model returned unknown cluster {0}")]
pub struct UnknownClusterError(pub usize);

/// Immutable scaler + clustering model pair, loaded once and shared across requests.
#[derive(Debug, Clone)]
pub struct PotentialClassifier {
    scaler: Arc<dyn FeatureScaler>,
    model: Arc<dyn ClusterModel>,
}

impl PotentialClassifier {
    pub fn new(scaler: Arc<dyn FeatureScaler>, model: Arc<dyn ClusterModel>) -> Self {
        Self { scaler, model }
    }

    /// Load both artifacts. Callers treat failure as fatal.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let scaler = StandardScaler::from_path(&config.scaler_path)?;
        let model = KMeansModel::from_path(&config.model_path)?;

        info!(
            scaler = %config.scaler_path.display(),
            model = %config.model_path.display(),
            mapping = TIER_MAPPING_VERSION,
            "potential model loaded"
        );

        Ok(Self::new(Arc::new(scaler), Arc::new(model)))
    }

    pub fn classify_one(
        &self,
        features: FeatureVector,
    ) -> Result<PotentialTier, UnknownClusterError> {
        let scaled = self.scaler.transform(features.to_array());
        let raw = self.model.predict(scaled);
        tier_for_cluster(raw).ok_or(UnknownClusterError(raw))
    }

    /// Classify a batch; the first unmappable cluster aborts the whole batch.
    pub fn classify(
        &self,
        features: &[FeatureVector],
    ) -> Result<Vec<PotentialTier>, UnknownClusterError> {
        features
            .iter()
            .map(|vector| self.classify_one(*vector))
            .collect()
    }
}
