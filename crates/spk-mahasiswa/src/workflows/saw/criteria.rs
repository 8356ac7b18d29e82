use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Whether larger raw values are better (`Benefit`) or worse (`Cost`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Benefit,
    Cost,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "benefit" => Some(Direction::Benefit),
            "cost" => Some(Direction::Cost),
            _ => None,
        }
    }
}

/// One weighted sub-criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionSpec {
    pub group: String,
    pub sub_criterion: String,
    pub direction: Direction,
    pub weight: f64,
}

impl CriterionSpec {
    /// Name of the table column this criterion scores: `{group}_{sub_criterion}`.
    pub fn column_key(&self) -> String {
        format!("{}_{}", self.group, self.sub_criterion)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    #[error("criteria payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("criterion {key}: unknown type '{value}' (expected benefit or cost)")]
    UnknownDirection { key: String, value: String },
    #[error("criterion {key}: weight {weight} must be a finite, non-negative number")]
    InvalidWeight { key: String, weight: f64 },
}

/// Criterion as served by the criteria endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CriterionPayload {
    pub criteria_group: String,
    pub sub_criteria: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub weight: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CriteriaEnvelope {
    Wrapped { data: Vec<CriterionPayload> },
    Bare(Vec<CriterionPayload>),
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("weight '{text}' is not a number"))),
    }
}

/// Snapshot of every known criterion, grouped by criteria group then sub-criterion.
///
/// Fetched fresh for each normalize or rank request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaRegistry {
    groups: BTreeMap<String, BTreeMap<String, CriterionSpec>>,
}

impl CriteriaRegistry {
    /// Build from specs; a repeated group/sub-criterion pair keeps the later entry.
    pub fn from_specs<I>(specs: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = CriterionSpec>,
    {
        let mut groups: BTreeMap<String, BTreeMap<String, CriterionSpec>> = BTreeMap::new();
        for spec in specs {
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(CriteriaError::InvalidWeight {
                    key: spec.column_key(),
                    weight: spec.weight,
                });
            }
            groups
                .entry(spec.group.clone())
                .or_default()
                .insert(spec.sub_criterion.clone(), spec);
        }
        Ok(Self { groups })
    }

    pub fn from_payloads<I>(payloads: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = CriterionPayload>,
    {
        let specs = payloads
            .into_iter()
            .map(|payload| {
                let direction =
                    Direction::parse(&payload.kind).ok_or_else(|| CriteriaError::UnknownDirection {
                        key: format!("{}_{}", payload.criteria_group, payload.sub_criteria),
                        value: payload.kind.clone(),
                    })?;
                Ok(CriterionSpec {
                    group: payload.criteria_group,
                    sub_criterion: payload.sub_criteria,
                    direction,
                    weight: payload.weight,
                })
            })
            .collect::<Result<Vec<_>, CriteriaError>>()?;
        Self::from_specs(specs)
    }

    /// Parse a criteria response body: a bare array or `{"data": [...]}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CriteriaError> {
        let payloads = match serde_json::from_slice::<CriteriaEnvelope>(bytes)? {
            CriteriaEnvelope::Wrapped { data } => data,
            CriteriaEnvelope::Bare(items) => items,
        };
        Self::from_payloads(payloads)
    }

    pub fn get(&self, group: &str, sub_criterion: &str) -> Option<&CriterionSpec> {
        self.groups.get(group)?.get(sub_criterion)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionSpec> {
        self.groups.values().flat_map(BTreeMap::values)
    }

    /// Criterion whose composite key equals a table column name.
    pub fn for_column(&self, column: &str) -> Option<&CriterionSpec> {
        self.iter().find(|spec| spec.column_key() == column)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_wrapped_payloads() {
        let bare = br#"[
            {"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": 0.4},
            {"criteria_group": "Ekonomi", "sub_criteria": "Penghasilan", "type": "Cost", "weight": "0.35"}
        ]"#;
        let registry = CriteriaRegistry::from_json(bare).expect("bare payload parses");
        assert_eq!(registry.len(), 2);
        let income = registry.get("Ekonomi", "Penghasilan").expect("cost criterion");
        assert_eq!(income.direction, Direction::Cost);
        assert_eq!(income.weight, 0.35);
        assert_eq!(
            registry.for_column("Akademik_IPK").map(|spec| spec.weight),
            Some(0.4)
        );

        let wrapped = br#"{"data": [{"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": 1}]}"#;
        let registry = CriteriaRegistry::from_json(wrapped).expect("wrapped payload parses");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn later_duplicates_replace_earlier_entries() {
        let payload = br#"[
            {"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": 0.4},
            {"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": 0.6}
        ]"#;
        let registry = CriteriaRegistry::from_json(payload).expect("payload parses");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Akademik", "IPK").map(|spec| spec.weight), Some(0.6));
    }

    #[test]
    fn rejects_unknown_direction_and_negative_weight() {
        let payload = br#"[{"criteria_group": "A", "sub_criteria": "B", "type": "bonus", "weight": 1}]"#;
        assert!(matches!(
            CriteriaRegistry::from_json(payload),
            Err(CriteriaError::UnknownDirection { .. })
        ));

        let payload = br#"[{"criteria_group": "A", "sub_criteria": "B", "type": "cost", "weight": -0.5}]"#;
        match CriteriaRegistry::from_json(payload) {
            Err(CriteriaError::InvalidWeight { key, .. }) => assert_eq!(key, "A_B"),
            other => panic!("expected invalid weight, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_bodies() {
        assert!(matches!(
            CriteriaRegistry::from_json(b"<html>maintenance</html>"),
            Err(CriteriaError::Malformed(_))
        ));
        assert!(matches!(
            CriteriaRegistry::from_json(br#"[{"criteria_group": "A", "sub_criteria": "B", "type": "cost", "weight": "heavy"}]"#),
            Err(CriteriaError::Malformed(_))
        ));
    }
}
