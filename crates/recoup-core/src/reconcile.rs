//! The ingestion reconciler: converts an ordered sequence of row records
//! plus a caller-supplied agency identity into persisted account rows,
//! reusing existing agency/client/consumer rows whenever their natural key
//! already exists.
//!
//! Rows are validated and committed one at a time, in input order. A
//! failure midway aborts the remaining rows but leaves earlier rows
//! persisted. There is deliberately no whole-file transaction.

use thiserror::Error;

use crate::{
  entity::parse_balance,
  store::{AccountStore, StoreError},
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// The agency on whose behalf a file is ingested.
#[derive(Debug, Clone)]
pub struct AgencyIdentity {
  pub name:         String,
  pub reference_no: String,
}

/// One ingestion row, all fields as raw text. Balance and status are
/// validated here, not by the row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
  pub client_reference_no: String,
  pub consumer_name:       String,
  pub consumer_address:    String,
  pub ssn:                 String,
  pub balance:             String,
  pub status:              String,
}

/// How a newly created client gets its name.
///
/// The two ingestion paths have always disagreed here: the CLI fills the
/// client name from the row's consumer-name field, while the HTTP upload
/// leaves it empty. The divergence looks accidental but is preserved
/// as-is pending product clarification (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientNaming {
  /// CLI path: a created client takes the row's consumer name.
  ConsumerName,
  /// HTTP path: a created client's name is left empty.
  Unnamed,
}

// ─── Output types ────────────────────────────────────────────────────────────

/// What one ingestion call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
  pub agency_created:    bool,
  pub rows_read:         usize,
  pub accounts_created:  usize,
  pub clients_created:   usize,
  pub consumers_created: usize,
}

/// Ingestion failure. Row numbers are 1-based data-row positions (the
/// header is not counted). Rows before the failing one are already
/// committed when this is returned.
#[derive(Debug, Error)]
pub enum IngestError<E: StoreError> {
  #[error(
    "row {row}: invalid status {value:?} (expected IN_COLLECTION, PAID_IN_FULL or INACTIVE)"
  )]
  InvalidStatus { row: usize, value: String },

  #[error("row {row}: balance {value:?} is not a decimal with at most 2 fractional digits")]
  InvalidBalance { row: usize, value: String },

  /// The row source itself failed (e.g. a malformed CSV record).
  #[error("row {row}: {source}")]
  Row {
    row:    usize,
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E: StoreError> IngestError<E> {
  /// True for errors caused by the input data rather than the store.
  pub fn is_validation(&self) -> bool {
    !matches!(self, IngestError::Store(_))
  }
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Ingest `rows` on behalf of `identity`.
///
/// Resolves the agency once (get-or-create by `reference_no`; an existing
/// agency keeps its stored name even if `identity.name` differs), then for
/// each row in input order: validates balance and status, resolves the
/// client by `reference_no` and the consumer by `ssn`, and appends a brand
/// new account. Accounts are never deduplicated.
pub async fn ingest<S, I, E>(
  store: &S,
  identity: &AgencyIdentity,
  rows: I,
  naming: ClientNaming,
) -> Result<IngestSummary, IngestError<S::Error>>
where
  S: AccountStore,
  I: IntoIterator<Item = Result<RawRow, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  let (agency, agency_created) = store
    .get_or_create_agency(&identity.name, &identity.reference_no)
    .await
    .map_err(IngestError::Store)?;

  let mut summary = IngestSummary {
    agency_created,
    ..IngestSummary::default()
  };

  for (idx, row) in rows.into_iter().enumerate() {
    let row_no = idx + 1;
    let row = row.map_err(|e| IngestError::Row {
      row:    row_no,
      source: Box::new(e),
    })?;

    // Validate before touching the store, so a bad row creates nothing.
    let balance =
      parse_balance(&row.balance).ok_or_else(|| IngestError::InvalidBalance {
        row:   row_no,
        value: row.balance.clone(),
      })?;
    let status =
      row
        .status
        .parse()
        .map_err(|_| IngestError::InvalidStatus {
          row:   row_no,
          value: row.status.clone(),
        })?;

    let client_name = match naming {
      ClientNaming::ConsumerName => Some(row.consumer_name.as_str()),
      ClientNaming::Unnamed => None,
    };
    let (client, client_created) = store
      .get_or_create_client(agency.agency_id, &row.client_reference_no, client_name)
      .await
      .map_err(IngestError::Store)?;

    let (consumer, consumer_created) = store
      .get_or_create_consumer(&row.consumer_name, &row.consumer_address, &row.ssn)
      .await
      .map_err(IngestError::Store)?;

    store
      .create_account(client.client_id, consumer.consumer_id, balance, status)
      .await
      .map_err(IngestError::Store)?;

    summary.rows_read += 1;
    summary.accounts_created += 1;
    summary.clients_created += usize::from(client_created);
    summary.consumers_created += usize::from(consumer_created);
  }

  Ok(summary)
}
