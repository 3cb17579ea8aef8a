//! Error types for `fraudlens-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An analytics operation named a column the record type does not have.
  #[error("unknown column: {0:?}")]
  UnknownColumn(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
