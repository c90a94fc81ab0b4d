//! Review dataset loading
//!
//! Reads the review CSV, keeps the rows that carry review text and yields
//! them in file order. Row order is load-bearing: it decides review ids and
//! score rows downstream.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_TEXT_COLUMN: &str = "Review Text";
pub const DEFAULT_LABEL_COLUMN: &str = "Class Name";

/// Cell values treated as missing, in addition to the empty cell
const NULL_MARKERS: &[&str] = &[
  "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
  "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Names of the columns the loader reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetColumns {
  pub text: String,
  pub label: String,
}

impl Default for DatasetColumns {
  fn default() -> Self {
    Self { text: DEFAULT_TEXT_COLUMN.to_string(), label: DEFAULT_LABEL_COLUMN.to_string() }
  }
}

/// One retained dataset row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
  pub text: String,
  pub class_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum DatasetError {
  #[error("failed to read dataset: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed dataset: {0}")]
  Csv(#[from] csv::Error),

  #[error("dataset has no '{column}' column (found: {found})")]
  MissingColumn { column: String, found: String },
}

/// Load the review rows of the CSV file at `path`
pub fn load_reviews(path: &Path, columns: &DatasetColumns) -> Result<Vec<ReviewRow>, DatasetError> {
  let file = File::open(path)?;
  read_reviews(file, columns)
}

/// Read review rows from any CSV source with a header row
pub fn read_reviews<R: Read>(
  source: R,
  columns: &DatasetColumns,
) -> Result<Vec<ReviewRow>, DatasetError> {
  let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(source);

  let headers = reader.headers()?.clone();
  let text_idx = column_index(&headers, &columns.text)?;
  let label_idx = column_index(&headers, &columns.label)?;

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;

    let Some(text) = record.get(text_idx).filter(|cell| !is_missing(cell)) else {
      continue;
    };

    let class_name =
      record.get(label_idx).filter(|cell| !is_missing(cell)).map(|cell| cell.to_string());

    rows.push(ReviewRow { text: text.to_string(), class_name });
  }

  Ok(rows)
}

/// Whether a cell holds no value
pub fn is_missing(cell: &str) -> bool {
  cell.is_empty() || NULL_MARKERS.contains(&cell)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DatasetError> {
  headers.iter().position(|header| header.trim() == name).ok_or_else(|| {
    DatasetError::MissingColumn {
      column: name.to_string(),
      found: headers.iter().collect::<Vec<_>>().join(", "),
    }
  })
}
