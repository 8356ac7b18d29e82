//! Potential-tier classification of the student roster and the applicant merge on top of it.

pub mod classifier;
pub mod grade;
pub mod join;
pub mod model;
pub mod roster;
pub mod router;
pub mod service;
pub mod specialization;
pub mod tier;

pub use classifier::{PotentialClassifier, UnknownClusterError};
pub use grade::grade_to_numeric;
pub use join::{merge_applicants, DuplicateKeyError, JoinError, JoinSide, COL_POTENTIAL};
pub use model::{
    ClusterModel, FeatureScaler, FeatureVector, KMeansModel, ModelError, StandardScaler,
    FEATURE_COUNT,
};
pub use roster::{classify_roster, extract_students, ClassifiedRoster, RosterError, StudentRecord};
pub use router::potential_router;
pub use service::{ClassificationOutcome, PotentialError, PotentialService};
pub use specialization::Specialization;
pub use tier::{tier_for_cluster, PotentialTier, CLUSTER_COUNT, TIER_MAPPING_VERSION};
