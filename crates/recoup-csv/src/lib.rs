//! Delimited-text reader for recoup account files.
//!
//! Converts CSV bytes into [`recoup_core::reconcile::RawRow`] values. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! The header row must contain exactly the six columns in [`COLUMNS`], in
//! any order. A malformed header fails at reader construction, before any
//! row is read. Field values pass through verbatim; type validation of
//! balance and status belongs to the reconciler.
//!
//! # Quick start
//!
//! ```no_run
//! use recoup_csv::RowReader;
//!
//! let data = "client reference no,consumer name,consumer address,ssn,balance,status\n\
//!             CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION\n";
//! for row in RowReader::new(data.as_bytes()).unwrap() {
//!   println!("{:?}", row.unwrap());
//! }
//! ```

pub mod error;
mod parse;

pub use error::{Error, Result};
pub use parse::{COLUMNS, RowReader};
