//! Error types for the fraudlens CSV parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The upload is missing required columns. Reported before any row is
  /// parsed, so nothing downstream has been touched.
  #[error("csv is missing required column(s): {}", .0.join(", "))]
  SchemaMismatch(Vec<String>),

  /// A field failed type coercion. `row` is the 1-based data row (the
  /// header line is row 0).
  #[error("row {row}, column {column:?}: {message}")]
  Parse {
    row:     usize,
    column:  &'static str,
    message: String,
  },

  #[error("csv read error: {0}")]
  Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
