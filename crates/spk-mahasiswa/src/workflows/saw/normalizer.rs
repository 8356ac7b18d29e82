use super::criteria::{CriteriaRegistry, Direction};
use crate::table::{ScoreTable, TableError};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("criterion column '{column}' row {row}: negative value {value} cannot be normalized")]
    NegativeValue {
        column: String,
        row: usize,
        value: f64,
    },
    #[error("cost column '{column}' row {row}: value 0 cannot be normalized")]
    ZeroCostValue { column: String, row: usize },
}

/// Rescale every criterion column in place.
///
/// Benefit columns become `v / max` (all zeros when the maximum is 0); cost columns become
/// `min / v` and reject a 0 anywhere in the column. Negative values are rejected in either
/// direction, so every rescaled value lies in `[0, 1]`. Columns without a matching criterion are
/// left untouched. Returns the names of the columns that were rescaled, in table order.
pub fn normalize(
    table: &mut ScoreTable,
    registry: &CriteriaRegistry,
) -> Result<Vec<String>, NormalizeError> {
    let matched: Vec<(String, Direction)> = table
        .columns()
        .iter()
        .filter_map(|column| {
            registry
                .for_column(column)
                .map(|spec| (column.clone(), spec.direction))
        })
        .collect();

    for (column, direction) in &matched {
        let values = table.numeric_column(column)?;
        if let Some(row) = values.iter().position(|value| *value < 0.0) {
            return Err(NormalizeError::NegativeValue {
                column: column.clone(),
                row: row + 1,
                value: values[row],
            });
        }
        let rescaled = match direction {
            Direction::Benefit => benefit(&values),
            Direction::Cost => cost(column, &values)?,
        };
        table.set_numeric_column(column, rescaled);
    }

    Ok(matched.into_iter().map(|(column, _)| column).collect())
}

fn benefit(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|value| value / max).collect()
}

fn cost(column: &str, values: &[f64]) -> Result<Vec<f64>, NormalizeError> {
    if let Some(row) = values.iter().position(|value| *value == 0.0) {
        return Err(NormalizeError::ZeroCostValue {
            column: column.to_string(),
            row: row + 1,
        });
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    Ok(values.iter().map(|value| min / value).collect())
}
