//! Fitted scaler and clustering model behind narrow traits.
//!
//! Artifacts are exported from the training notebook as JSON:
//! `{"mean": [..5], "scale": [..5]}` for the scaler and `{"centroids": [[..5]; 4]}` for the
//! clustering model.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::tier::CLUSTER_COUNT;

pub const FEATURE_COUNT: usize = 5;

/// Per-student inputs to the clustering model, in training column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub algorithm_numeric: f64,
    pub statistics_numeric: f64,
    pub project_score: f64,
    pub academic_discipline: f64,
    pub activity: f64,
}

impl FeatureVector {
    pub fn to_array(self) -> [f64; FEATURE_COUNT] {
        [
            self.algorithm_numeric,
            self.statistics_numeric,
            self.project_score,
            self.academic_discipline,
            self.activity,
        ]
    }
}

/// Standardizes raw features the same way the training pipeline did.
pub trait FeatureScaler: Debug + Send + Sync {
    fn transform(&self, features: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT];
}

/// Assigns a raw cluster id to a standardized feature vector.
pub trait ClusterModel: Debug + Send + Sync {
    fn predict(&self, scaled: [f64; FEATURE_COUNT]) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unable to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {} is invalid: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

/// Fitted z-score scaler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Self { mean, scale }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let scaler: Self = read_artifact(path)?;
        if !all_finite(&scaler.mean) || !all_finite(&scaler.scale) {
            return Err(ModelError::Invalid {
                path: path.to_path_buf(),
                reason: "mean and scale must be finite".to_string(),
            });
        }
        Ok(scaler)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (index, value) in features.into_iter().enumerate() {
            // Constant training columns were stored with a zero scale.
            let scale = if self.scale[index] == 0.0 {
                1.0
            } else {
                self.scale[index]
            };
            scaled[index] = (value - self.mean[index]) / scale;
        }
        scaled
    }
}

/// Nearest-centroid assignment from a fitted k-means model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KMeansModel {
    centroids: Vec<[f64; FEATURE_COUNT]>,
}

impl KMeansModel {
    pub fn new(centroids: Vec<[f64; FEATURE_COUNT]>) -> Self {
        Self { centroids }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let model: Self = read_artifact(path)?;

        if model.centroids.len() != CLUSTER_COUNT {
            return Err(ModelError::Invalid {
                path: path.to_path_buf(),
                reason: format!(
                    "expected {CLUSTER_COUNT} centroids, found {}",
                    model.centroids.len()
                ),
            });
        }
        if !model.centroids.iter().all(|centroid| all_finite(centroid)) {
            return Err(ModelError::Invalid {
                path: path.to_path_buf(),
                reason: "centroids must be finite".to_string(),
            });
        }

        Ok(model)
    }
}

impl ClusterModel for KMeansModel {
    /// Ties resolve to the lowest cluster id.
    fn predict(&self, scaled: [f64; FEATURE_COUNT]) -> usize {
        self.centroids
            .iter()
            .enumerate()
            .map(|(index, centroid)| {
                let distance: f64 = centroid
                    .iter()
                    .zip(scaled.iter())
                    .map(|(c, x)| (c - x).powi(2))
                    .sum();
                (index, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}
