//! Error type for `recoup-csv`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("missing column {0:?} in header")]
  MissingColumn(&'static str),

  #[error("unexpected column {0:?} in header")]
  UnexpectedColumn(String),

  #[error("duplicate column {0:?} in header")]
  DuplicateColumn(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
