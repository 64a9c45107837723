//! [`RowReader`]: header validation and row iteration.

use std::io;

use recoup_core::reconcile::RawRow;

use crate::{Error, Result};

/// The exact column set an ingestion file must carry, in canonical order.
/// Files may list them in any order; the reader resolves positions from the
/// header.
pub const COLUMNS: [&str; 6] = [
  "client reference no",
  "consumer name",
  "consumer address",
  "ssn",
  "balance",
  "status",
];

/// Streaming reader over an ingestion file.
///
/// Construction validates the header; iteration yields one [`RawRow`] per
/// record. A record with the wrong field count surfaces as `Err` from the
/// iterator, leaving rows already yielded unaffected.
pub struct RowReader<R: io::Read> {
  records: csv::StringRecordsIntoIter<R>,
  // Position of each canonical column within the file's header.
  indices: [usize; 6],
}

impl<R: io::Read> RowReader<R> {
  pub fn new(reader: R) -> Result<Self> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();

    for h in headers.iter() {
      if !COLUMNS.contains(&h) {
        return Err(Error::UnexpectedColumn(h.to_owned()));
      }
    }

    let mut indices = [0usize; 6];
    for (slot, name) in COLUMNS.into_iter().enumerate() {
      let mut found = None;
      for (i, h) in headers.iter().enumerate() {
        if h == name {
          if found.is_some() {
            return Err(Error::DuplicateColumn(name));
          }
          found = Some(i);
        }
      }
      indices[slot] = found.ok_or(Error::MissingColumn(name))?;
    }

    Ok(Self {
      records: rdr.into_records(),
      indices,
    })
  }
}

impl<R: io::Read> Iterator for RowReader<R> {
  type Item = Result<RawRow>;

  fn next(&mut self) -> Option<Self::Item> {
    let record = match self.records.next()? {
      Ok(r) => r,
      Err(e) => return Some(Err(e.into())),
    };

    let field = |slot: usize| record.get(self.indices[slot]).unwrap_or("").to_owned();

    Some(Ok(RawRow {
      client_reference_no: field(0),
      consumer_name:       field(1),
      consumer_address:    field(2),
      ssn:                 field(3),
      balance:             field(4),
      status:              field(5),
    }))
  }
}
