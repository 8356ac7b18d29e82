use std::collections::HashSet;

use serde::Serialize;

use super::classifier::{PotentialClassifier, UnknownClusterError};
use super::grade::cell_to_numeric;
use super::join::{DuplicateKeyError, JoinSide};
use super::model::FeatureVector;
use super::specialization::Specialization;
use super::tier::PotentialTier;
use crate::table::{Cell, ScoreTable, TableError};

pub const COL_NPM: &str = "NPM";
pub const COL_NAME: &str = "Nama Mahasiswa";
pub const COL_ALGORITHM: &str = "Algoritma";
pub const COL_STATISTICS: &str = "Statistika";
pub const COL_PROJECT: &str = "Nilai Project";
pub const COL_DISCIPLINE: &str = "Kedisiplinan Akademik";
pub const COL_ACTIVITY: &str = "Keaktifan";

pub const COL_ALGORITHM_NUMERIC: &str = "Algoritma_Numeric";
pub const COL_STATISTICS_NUMERIC: &str = "Statistika_Numeric";
pub const COL_SPECIALIZATION: &str = "Peminatan";
pub const COL_CLUSTER: &str = "Cluster";
pub const COL_CLUSTER_LABEL: &str = "Label Cluster";

const REQUIRED_COLUMNS: [&str; 7] = [
    COL_NPM,
    COL_NAME,
    COL_ALGORITHM,
    COL_STATISTICS,
    COL_PROJECT,
    COL_DISCIPLINE,
    COL_ACTIVITY,
];

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("row {row}: missing student identifier ({COL_NPM})")]
    MissingIdentifier { row: usize },
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
    #[error(transparent)]
    UnknownCluster(#[from] UnknownClusterError),
}

/// One roster row after grade conversion and feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub npm: String,
    pub name: Option<String>,
    pub algorithm_numeric: u8,
    pub statistics_numeric: u8,
    pub specialization: Specialization,
    pub features: FeatureVector,
}

/// Derived roster with one tier per student, in input order.
#[derive(Debug, Clone)]
pub struct ClassifiedRoster {
    pub students: Vec<StudentRecord>,
    pub tiers: Vec<PotentialTier>,
    pub table: ScoreTable,
}

/// Read typed student records out of a roster table.
///
/// Any missing or non-numeric score aborts the whole roster; identifiers must be present
/// and unique.
pub fn extract_students(table: &ScoreTable) -> Result<Vec<StudentRecord>, RosterError> {
    for column in REQUIRED_COLUMNS {
        table.require_column(column)?;
    }
    let npm_index = table.require_column(COL_NPM)?;
    let name_index = table.require_column(COL_NAME)?;
    let algorithm_index = table.require_column(COL_ALGORITHM)?;
    let statistics_index = table.require_column(COL_STATISTICS)?;

    let project = table.numeric_column(COL_PROJECT)?;
    let discipline = table.numeric_column(COL_DISCIPLINE)?;
    let activity = table.numeric_column(COL_ACTIVITY)?;

    let mut seen = HashSet::new();
    let mut students = Vec::with_capacity(table.len());

    for (row, cells) in table.rows().enumerate() {
        let npm = cells[npm_index]
            .key()
            .ok_or(RosterError::MissingIdentifier { row: row + 1 })?;
        if !seen.insert(npm.clone()) {
            return Err(DuplicateKeyError {
                side: JoinSide::Roster,
                key: npm,
            }
            .into());
        }

        let name = cells[name_index].key();
        let algorithm_numeric = cell_to_numeric(&cells[algorithm_index]);
        let statistics_numeric = cell_to_numeric(&cells[statistics_index]);

        let features = FeatureVector {
            algorithm_numeric: f64::from(algorithm_numeric),
            statistics_numeric: f64::from(statistics_numeric),
            project_score: project[row],
            academic_discipline: discipline[row],
            activity: activity[row],
        };
        let specialization = Specialization::classify(
            features.algorithm_numeric,
            features.statistics_numeric,
            features.project_score,
        );

        students.push(StudentRecord {
            npm,
            name,
            algorithm_numeric,
            statistics_numeric,
            specialization,
            features,
        });
    }

    Ok(students)
}

/// Derive grade, specialization and potential columns for every roster row.
pub fn classify_roster(
    mut table: ScoreTable,
    classifier: &PotentialClassifier,
) -> Result<ClassifiedRoster, RosterError> {
    let students = extract_students(&table)?;
    let features: Vec<FeatureVector> = students.iter().map(|student| student.features).collect();
    let tiers = classifier.classify(&features)?;

    table.set_numeric_column(
        COL_ALGORITHM_NUMERIC,
        students
            .iter()
            .map(|student| f64::from(student.algorithm_numeric))
            .collect(),
    );
    table.set_numeric_column(
        COL_STATISTICS_NUMERIC,
        students
            .iter()
            .map(|student| f64::from(student.statistics_numeric))
            .collect(),
    );
    table.set_column(
        COL_SPECIALIZATION,
        students
            .iter()
            .map(|student| Cell::text(student.specialization.label()))
            .collect(),
    );
    table.set_numeric_column(
        COL_CLUSTER,
        tiers.iter().map(|tier| f64::from(tier.ordinal())).collect(),
    );
    table.set_column(
        COL_CLUSTER_LABEL,
        tiers.iter().map(|tier| Cell::text(tier.label())).collect(),
    );

    Ok(ClassifiedRoster {
        students,
        tiers,
        table,
    })
}
