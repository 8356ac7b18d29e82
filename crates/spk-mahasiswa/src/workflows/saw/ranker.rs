use std::cmp::Ordering;

use super::criteria::CriteriaRegistry;
use super::ScoreScope;
use crate::table::{Cell, ScoreTable, TableError};

pub const COL_SAW_SCORE: &str = "SAW_Score";
pub const COL_RANK: &str = "Rank";

/// Weight every criterion column in place, then append `SAW_Score` and `Rank`.
///
/// Rows keep their input order. Returns the names of the weighted columns.
pub fn rank(
    table: &mut ScoreTable,
    registry: &CriteriaRegistry,
    scope: ScoreScope,
) -> Result<Vec<String>, TableError> {
    let weighted: Vec<(String, f64)> = table
        .columns()
        .iter()
        .filter(|column| !is_output_column(column))
        .filter_map(|column| {
            registry
                .for_column(column)
                .map(|spec| (column.clone(), spec.weight))
        })
        .collect();

    let mut scores = vec![0.0; table.len()];
    for (column, weight) in &weighted {
        let values: Vec<f64> = table
            .numeric_column(column)?
            .into_iter()
            .map(|value| value * weight)
            .collect();
        if scope == ScoreScope::Criteria {
            for (score, value) in scores.iter_mut().zip(&values) {
                *score += value;
            }
        }
        table.set_numeric_column(column, values);
    }

    if scope == ScoreScope::Row {
        scores = row_sums(table);
    }

    let ranks = competition_ranks(&scores);
    table.set_numeric_column(COL_SAW_SCORE, scores);
    table.set_column(
        COL_RANK,
        ranks.into_iter().map(|rank| Cell::Number(rank as f64)).collect(),
    );

    Ok(weighted.into_iter().map(|(column, _)| column).collect())
}

fn is_output_column(column: &str) -> bool {
    column == COL_SAW_SCORE || column == COL_RANK
}

/// Sum of every numeric cell in each row, ignoring earlier `SAW_Score` and `Rank` values.
fn row_sums(table: &ScoreTable) -> Vec<f64> {
    let included: Vec<bool> = table
        .columns()
        .iter()
        .map(|column| !is_output_column(column))
        .collect();
    table
        .rows()
        .map(|row| {
            row.iter()
                .zip(&included)
                .filter(|(_, keep)| **keep)
                .filter_map(|(cell, _)| cell.as_number())
                .sum()
        })
        .collect()
}

/// Standard competition ranking, highest score first: ties share a rank and the next
/// distinct score resumes at `tied_rank + tied_count`.
pub fn competition_ranks(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|left, right| {
        scores[*right]
            .partial_cmp(&scores[*left])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0; scores.len()];
    for (position, index) in order.iter().enumerate() {
        ranks[*index] = match position {
            0 => 1,
            _ => {
                let previous = order[position - 1];
                if scores[previous] == scores[*index] {
                    ranks[previous]
                } else {
                    position + 1
                }
            }
        };
    }
    ranks
}
