use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use super::roster::{COL_CLUSTER, COL_CLUSTER_LABEL, COL_NAME, COL_NPM};
use crate::table::{Cell, ScoreTable, TableError};

/// Column name the roster's `Cluster` takes in merged applicant rows.
pub const COL_POTENTIAL: &str = "Potensi";

/// Roster columns carried into the merged view, keyed on `NPM`.
const PROJECTED_COLUMNS: [&str; 3] = [COL_NAME, COL_CLUSTER, COL_CLUSTER_LABEL];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinSide {
    Applicants,
    Roster,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Applicants => write!(f, "applicant"),
            JoinSide::Roster => write!(f, "roster"),
        }
    }
}

/// A join key repeats on one side, so the merge cannot be one-to-one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate {side} identifier '{key}': merge must be one-to-one")]
pub struct DuplicateKeyError {
    pub side: JoinSide,
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
}

/// Left-join applicants onto the classified roster by `NPM`.
///
/// Every applicant row is kept, in order. Unmatched rows get empty roster columns. Column
/// names shared by both sides are suffixed `_x` (applicant) and `_y` (roster).
pub fn merge_applicants(
    applicants: &ScoreTable,
    roster: &ScoreTable,
) -> Result<ScoreTable, JoinError> {
    let left_key = applicants.require_column(COL_NPM)?;
    let right_key = roster.require_column(COL_NPM)?;
    let projected = PROJECTED_COLUMNS
        .iter()
        .map(|column| roster.require_column(column))
        .collect::<Result<Vec<_>, _>>()?;

    let roster_rows = index_unique(roster, right_key, JoinSide::Roster)?;
    index_unique(applicants, left_key, JoinSide::Applicants)?;

    let overlap: HashSet<&str> = PROJECTED_COLUMNS
        .iter()
        .copied()
        .filter(|column| applicants.column_index(column).is_some())
        .collect();

    let mut columns: Vec<String> = applicants
        .columns()
        .iter()
        .map(|column| {
            if overlap.contains(column.as_str()) {
                format!("{column}_x")
            } else {
                column.clone()
            }
        })
        .collect();
    columns.extend(PROJECTED_COLUMNS.iter().map(|column| {
        if overlap.contains(column) {
            format!("{column}_y")
        } else if *column == COL_CLUSTER {
            COL_POTENTIAL.to_string()
        } else {
            column.to_string()
        }
    }));

    let mut merged = ScoreTable::new(columns)?;
    for cells in applicants.rows() {
        let matched = cells[left_key]
            .key()
            .and_then(|key| roster_rows.get(&key))
            .and_then(|row| roster.row(*row));

        let mut out = cells.to_vec();
        out.extend(projected.iter().map(|index| match matched {
            Some(roster_cells) => roster_cells[*index].clone(),
            None => Cell::Empty,
        }));
        merged.push_row(out);
    }

    Ok(merged)
}

/// Map each present key to its row, rejecting repeats. Blank keys never match.
fn index_unique(
    table: &ScoreTable,
    key_column: usize,
    side: JoinSide,
) -> Result<HashMap<String, usize>, DuplicateKeyError> {
    let mut index = HashMap::with_capacity(table.len());
    for (row, cells) in table.rows().enumerate() {
        let Some(key) = cells[key_column].key() else {
            continue;
        };
        if index.insert(key.clone(), row).is_some() {
            return Err(DuplicateKeyError { side, key });
        }
    }
    Ok(index)
}
