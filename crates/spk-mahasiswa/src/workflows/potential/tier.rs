use serde::Serialize;

/// Version tag of [`RAW_CLUSTER_TIERS`]. Bump together with the clustering artifact.
pub const TIER_MAPPING_VERSION: &str = "kmeans-k4-2024.1";

/// Number of clusters the fitted model produces.
pub const CLUSTER_COUNT: usize = 4;

/// Ordinal potential scale reported for every student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PotentialTier {
    High,
    Low,
    None,
    Medium,
}

impl PotentialTier {
    pub const ALL: [PotentialTier; CLUSTER_COUNT] = [
        PotentialTier::High,
        PotentialTier::Low,
        PotentialTier::None,
        PotentialTier::Medium,
    ];

    /// Stable ordinal written to the `Cluster` column.
    pub fn ordinal(self) -> u8 {
        match self {
            PotentialTier::High => 0,
            PotentialTier::Low => 1,
            PotentialTier::None => 2,
            PotentialTier::Medium => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PotentialTier::High => "Potensi Tinggi",
            PotentialTier::Low => "Potensi Rendah",
            PotentialTier::None => "Tidak ada potensi",
            PotentialTier::Medium => "Potensi Sedang",
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.ordinal() == ordinal)
    }
}

/// Tier for each raw cluster id of the fitted model, indexed by raw id.
///
/// Cluster ids carry no meaning on their own; this table pins them to the scale above for
/// the artifact identified by [`TIER_MAPPING_VERSION`].
pub const RAW_CLUSTER_TIERS: [PotentialTier; CLUSTER_COUNT] = [
    PotentialTier::Medium,
    PotentialTier::High,
    PotentialTier::None,
    PotentialTier::Low,
];

pub fn tier_for_cluster(raw: usize) -> Option<PotentialTier> {
    RAW_CLUSTER_TIERS.get(raw).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn raw_clusters_map_to_expected_ordinals() {
        let ordinals: Vec<u8> = (0..CLUSTER_COUNT)
            .map(|raw| tier_for_cluster(raw).expect("mapped").ordinal())
            .collect();
        assert_eq!(ordinals, vec![3, 0, 2, 1]);
    }

    #[test]
    fn mapping_is_a_bijection() {
        let tiers: HashSet<PotentialTier> = RAW_CLUSTER_TIERS.into_iter().collect();
        assert_eq!(tiers.len(), CLUSTER_COUNT);
        assert!(tier_for_cluster(CLUSTER_COUNT).is_none());
    }

    #[test]
    fn ordinals_carry_fixed_labels() {
        let labels: Vec<&str> = (0..4u8)
            .map(|ordinal| PotentialTier::from_ordinal(ordinal).expect("tier").label())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Potensi Tinggi",
                "Potensi Rendah",
                "Tidak ada potensi",
                "Potensi Sedang"
            ]
        );
        assert!(PotentialTier::from_ordinal(4).is_none());
    }
}
