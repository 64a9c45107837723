//! Error type for `recoup-store-sqlite`.

use recoup_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A uniqueness constraint raced or was violated unexpectedly. Surfaced
  /// to the caller, not retried.
  #[error("uniqueness constraint violated: {0}")]
  Constraint(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("balance not representable: {0}")]
  Balance(String),

  #[error("unknown account status in store: {0:?}")]
  UnknownStatus(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, ref msg)) = e
      && code.code == rusqlite::ErrorCode::ConstraintViolation
    {
      return Error::Constraint(
        msg
          .clone()
          .unwrap_or_else(|| "constraint violation".to_owned()),
      );
    }
    Error::Database(e)
  }
}

impl StoreError for Error {
  fn is_constraint_violation(&self) -> bool {
    matches!(self, Error::Constraint(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
