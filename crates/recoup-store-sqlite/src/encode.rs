//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, statuses as their canonical
//! literals, and balances as integer cents so SQL range filters compare
//! integers and no floating-point representation ever appears.

use chrono::{DateTime, Utc};
use recoup_core::{
  entity::{Account, AccountStatus, Agency, Client, Consumer},
  store::{AccountRecord, ConsumerDetail},
};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── AccountStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: AccountStatus) -> &'static str {
  s.as_str()
}

pub fn decode_status(s: &str) -> Result<AccountStatus> {
  s.parse()
    .map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── Balance ─────────────────────────────────────────────────────────────────

/// Encode a balance as integer cents. Errors if the value carries more
/// than 2 significant fractional digits or overflows `i64`.
pub fn encode_balance(d: Decimal) -> Result<i64> {
  let mut d = d.normalize();
  if d.scale() > 2 {
    return Err(Error::Balance(format!(
      "{d} has more than 2 fractional digits"
    )));
  }
  d.rescale(2);
  i64::try_from(d.mantissa())
    .map_err(|_| Error::Balance(format!("{d} does not fit in 64-bit cents")))
}

pub fn decode_balance(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `agencies` row.
pub struct RawAgency {
  pub agency_id:    i64,
  pub name:         String,
  pub reference_no: String,
  pub created_at:   String,
}

impl RawAgency {
  pub fn into_agency(self) -> Result<Agency> {
    Ok(Agency {
      agency_id:    self.agency_id,
      name:         self.name,
      reference_no: self.reference_no,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `clients` row.
pub struct RawClient {
  pub client_id:    i64,
  pub agency_id:    i64,
  pub name:         String,
  pub reference_no: String,
  pub created_at:   String,
}

impl RawClient {
  pub fn into_client(self) -> Result<Client> {
    Ok(Client {
      client_id:    self.client_id,
      agency_id:    self.agency_id,
      name:         self.name,
      reference_no: self.reference_no,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `consumers` row.
pub struct RawConsumer {
  pub consumer_id: i64,
  pub name:        String,
  pub address:     String,
  pub ssn:         String,
  pub created_at:  String,
}

impl RawConsumer {
  pub fn into_consumer(self) -> Result<Consumer> {
    Ok(Consumer {
      consumer_id: self.consumer_id,
      name:        self.name,
      address:     self.address,
      ssn:         self.ssn,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    i64,
  pub client_id:     i64,
  pub consumer_id:   i64,
  pub balance_cents: i64,
  pub status:        String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:  self.account_id,
      client_id:   self.client_id,
      consumer_id: self.consumer_id,
      balance:     decode_balance(self.balance_cents),
      status:      decode_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from an `accounts` row joined with its consumer, for the
/// listing read model.
pub struct RawAccountRecord {
  pub client_id:        i64,
  pub consumer_name:    String,
  pub consumer_address: String,
  pub consumer_ssn:     String,
  pub balance_cents:    i64,
  pub status:           String,
}

impl RawAccountRecord {
  pub fn into_record(self) -> Result<AccountRecord> {
    Ok(AccountRecord {
      client:   self.client_id,
      consumer: ConsumerDetail {
        name:    self.consumer_name,
        address: self.consumer_address,
        ssn:     self.consumer_ssn,
      },
      balance:  decode_balance(self.balance_cents),
      status:   decode_status(&self.status)?,
    })
  }
}
