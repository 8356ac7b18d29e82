//! Column-ordered tabular data shared by every workflow.
//!
//! Uploaded spreadsheets arrive as CSV with arbitrary extra columns. Workflows look up the
//! columns they need by name, derive new ones, and hand the whole table back, so the
//! table keeps every column in its original order and serializes rows as JSON objects in
//! that same order.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Largest magnitude at which an `f64` still holds every integer exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single field value.
///
/// Numbers read from input keep the field text they were parsed from, so identifiers such
/// as `00123` or IDs beyond `f64` precision pass through unchanged. `Number` holds values
/// the pipeline derived itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Numeric { value: f64, raw: String },
    Text(String),
    Empty,
}

impl Cell {
    /// Interpret a raw CSV field: blank becomes `Empty`, finite numbers become `Numeric`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Numeric {
                value,
                raw: trimmed.to_string(),
            },
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) | Cell::Numeric { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text used when cells act as join keys.
    ///
    /// Input numbers keep their written form apart from an all-zero fraction, so `123` and
    /// `123.0` agree while `00123` and `123` stay distinct.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Number(value) => Some(format_number(*value)),
            Cell::Numeric { raw, .. } => Some(strip_zero_fraction(raw).to_string()),
            Cell::Text(value) => Some(value.clone()),
            Cell::Empty => None,
        }
    }

    fn to_field(&self) -> String {
        match self {
            Cell::Number(value) => format_number(*value),
            Cell::Numeric { raw, .. } => raw.clone(),
            Cell::Text(value) => value.clone(),
            Cell::Empty => String::new(),
        }
    }
}

fn as_exact_integer(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Some(value as i64)
    } else {
        None
    }
}

fn format_number(value: f64) -> String {
    match as_exact_integer(value) {
        Some(integer) => integer.to_string(),
        None => value.to_string(),
    }
}

/// `123.00` -> `123`; anything else is returned as written.
fn strip_zero_fraction(raw: &str) -> &str {
    match raw.split_once('.') {
        Some((whole, fraction))
            if !whole.is_empty()
                && !fraction.is_empty()
                && fraction.bytes().all(|byte| byte == b'0') =>
        {
            whole
        }
        _ => raw,
    }
}

/// Whether a JSON number would reproduce the field as written, ignoring trailing
/// fractional zeros.
fn renders_as_written(value: f64, raw: &str) -> bool {
    let written = if raw.contains('.') {
        raw.trim_end_matches('0').trim_end_matches('.')
    } else {
        raw
    };
    format_number(value) == written
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Number(value) if !value.is_finite() => serializer.serialize_none(),
            Cell::Number(value) => serialize_number(*value, serializer),
            Cell::Numeric { value, raw } if renders_as_written(*value, raw) => {
                serialize_number(*value, serializer)
            }
            Cell::Numeric { raw, .. } => serializer.serialize_str(raw),
            Cell::Text(value) => serializer.serialize_str(value),
            Cell::Empty => serializer.serialize_none(),
        }
    }
}

fn serialize_number<S: Serializer>(value: f64, serializer: S) -> Result<S::Ok, S::Error> {
    match as_exact_integer(value) {
        Some(integer) => serializer.serialize_i64(integer),
        None => serializer.serialize_f64(value),
    }
}

/// Failures while reading or interpreting tabular input.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("unable to read tabular input: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to read tabular input: {0}")]
    Io(#[from] std::io::Error),
    #[error("input has no header row")]
    MissingHeader,
    #[error("column '{0}' appears more than once in the header")]
    DuplicateColumn(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' row {row}: expected a number, found {found}")]
    NonNumeric {
        column: String,
        row: usize,
        found: String,
    },
}

impl TableError {
    fn non_numeric(column: &str, row: usize, cell: &Cell) -> Self {
        let found = match cell {
            Cell::Empty => "an empty cell".to_string(),
            other => format!("'{}'", other.to_field()),
        };
        TableError::NonNumeric {
            column: column.to_string(),
            row: row + 1,
            found,
        }
    }
}

/// Column-ordered table of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ScoreTable {
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() || headers.iter().all(|name| name.is_empty()) {
            return Err(TableError::MissingHeader);
        }

        let columns = headers
            .iter()
            .map(|name| name.trim_start_matches('\u{feff}').to_string())
            .collect();
        let mut table = Self::new(columns)?;

        for record in csv_reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(Cell::parse).collect());
        }

        Ok(table)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(Cell::to_field))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(cells);
    }

    /// Every value of a column as a number, failing on the first empty or textual cell.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>, TableError> {
        let index = self.require_column(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = &cells[index];
                cell.as_number()
                    .ok_or_else(|| TableError::non_numeric(column, row, cell))
            })
            .collect()
    }

    /// Replace a column's values, appending the column when it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let index = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Cell::Empty);
                }
                self.columns.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
    }

    pub fn set_numeric_column(&mut self, name: &str, values: Vec<f64>) {
        self.set_column(name, values.into_iter().map(Cell::Number).collect());
    }
}

impl Serialize for ScoreTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowObject {
                columns: &self.columns,
                cells: row,
            })?;
        }
        seq.end()
    }
}

struct RowObject<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
