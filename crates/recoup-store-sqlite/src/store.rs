//! [`SqliteStore`], the SQLite implementation of [`AccountStore`].

use std::path::Path;

use chrono::Utc;
use recoup_core::{
  entity::{Account, AccountStatus, Agency, Client, Consumer},
  store::{AccountQuery, AccountRecord, AccountStore, EntityCounts, Page},
};
use rusqlite::OptionalExtension as _;
use rust_decimal::Decimal;

use crate::{
  encode::{
    RawAccountRecord, RawAgency, RawClient, RawConsumer, decode_balance,
    encode_balance, encode_dt, encode_status,
  },
  error::{Error, Result},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A recoup account store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto the connection's worker thread, which is what makes
/// each get-or-create an atomic check-then-create under single-writer
/// conditions. Writers racing from other processes lose to the schema's
/// uniqueness constraints and surface [`Error::Constraint`].
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  // ── Get-or-create by natural key ──────────────────────────────────────────

  async fn get_or_create_agency(
    &self,
    name: &str,
    reference_no: &str,
  ) -> Result<(Agency, bool)> {
    let name = name.to_owned();
    let reference_no = reference_no.to_owned();
    let created_at = encode_dt(Utc::now());

    let (raw, created): (RawAgency, bool) = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT agency_id, name, reference_no, created_at
             FROM agencies WHERE reference_no = ?1",
            rusqlite::params![reference_no],
            |row| {
              Ok(RawAgency {
                agency_id:    row.get(0)?,
                name:         row.get(1)?,
                reference_no: row.get(2)?,
                created_at:   row.get(3)?,
              })
            },
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok((raw, false));
        }

        conn.execute(
          "INSERT INTO agencies (name, reference_no, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, reference_no, created_at],
        )?;

        Ok((
          RawAgency {
            agency_id: conn.last_insert_rowid(),
            name,
            reference_no,
            created_at,
          },
          true,
        ))
      })
      .await?;

    Ok((raw.into_agency()?, created))
  }

  async fn get_or_create_client(
    &self,
    agency_id: i64,
    reference_no: &str,
    name: Option<&str>,
  ) -> Result<(Client, bool)> {
    let reference_no = reference_no.to_owned();
    let name = name.unwrap_or("").to_owned();
    let created_at = encode_dt(Utc::now());

    let (raw, created): (RawClient, bool) = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT client_id, agency_id, name, reference_no, created_at
             FROM clients WHERE reference_no = ?1",
            rusqlite::params![reference_no],
            |row| {
              Ok(RawClient {
                client_id:    row.get(0)?,
                agency_id:    row.get(1)?,
                name:         row.get(2)?,
                reference_no: row.get(3)?,
                created_at:   row.get(4)?,
              })
            },
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok((raw, false));
        }

        conn.execute(
          "INSERT INTO clients (agency_id, name, reference_no, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![agency_id, name, reference_no, created_at],
        )?;

        Ok((
          RawClient {
            client_id: conn.last_insert_rowid(),
            agency_id,
            name,
            reference_no,
            created_at,
          },
          true,
        ))
      })
      .await?;

    Ok((raw.into_client()?, created))
  }

  async fn get_or_create_consumer(
    &self,
    name: &str,
    address: &str,
    ssn: &str,
  ) -> Result<(Consumer, bool)> {
    let name = name.to_owned();
    let address = address.to_owned();
    let ssn = ssn.to_owned();
    let created_at = encode_dt(Utc::now());

    let (raw, created): (RawConsumer, bool) = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT consumer_id, name, address, ssn, created_at
             FROM consumers WHERE ssn = ?1",
            rusqlite::params![ssn],
            |row| {
              Ok(RawConsumer {
                consumer_id: row.get(0)?,
                name:        row.get(1)?,
                address:     row.get(2)?,
                ssn:         row.get(3)?,
                created_at:  row.get(4)?,
              })
            },
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok((raw, false));
        }

        conn.execute(
          "INSERT INTO consumers (name, address, ssn, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, address, ssn, created_at],
        )?;

        Ok((
          RawConsumer {
            consumer_id: conn.last_insert_rowid(),
            name,
            address,
            ssn,
            created_at,
          },
          true,
        ))
      })
      .await?;

    Ok((raw.into_consumer()?, created))
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(
    &self,
    client_id: i64,
    consumer_id: i64,
    balance: Decimal,
    status: AccountStatus,
  ) -> Result<Account> {
    let balance_cents = encode_balance(balance)?;
    let status_str = encode_status(status).to_owned();
    let created_at = Utc::now();
    let created_at_str = encode_dt(created_at);

    let account_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (client_id, consumer_id, balance_cents, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![client_id, consumer_id, balance_cents, status_str, created_at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Account {
      account_id,
      client_id,
      consumer_id,
      // Stored at cent precision; report exactly what was persisted.
      balance: decode_balance(balance_cents),
      status,
      created_at,
    })
  }

  async fn list_accounts(&self, query: &AccountQuery) -> Result<Page<AccountRecord>> {
    let min_cents = query.min_balance.map(encode_balance).transpose()?;
    let max_cents = query.max_balance.map(encode_balance).transpose()?;
    let consumer_name = query.consumer_name.clone();
    let status = query.status.map(encode_status).map(str::to_owned);
    let limit = query.limit.unwrap_or(100) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let (count, raws): (i64, Vec<RawAccountRecord>) = self
      .conn
      .call(move |conn| {
        // Build WHERE clause and matching positional arguments together.
        let mut conds: Vec<&'static str> = vec![];
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(v) = min_cents {
          conds.push("a.balance_cents >= ?");
          args.push(Box::new(v));
        }
        if let Some(v) = max_cents {
          conds.push("a.balance_cents <= ?");
          args.push(Box::new(v));
        }
        if let Some(v) = consumer_name {
          // instr over lowered text rather than LIKE, so `%` and `_` in
          // the needle match literally.
          conds.push("instr(lower(c.name), lower(?)) > 0");
          args.push(Box::new(v));
        }
        if let Some(v) = status {
          conds.push("a.status = ?");
          args.push(Box::new(v));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };
        let from = "FROM accounts a JOIN consumers c ON c.consumer_id = a.consumer_id";

        let count: i64 = conn.query_row(
          &format!("SELECT COUNT(*) {from} {where_clause}"),
          rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
          |row| row.get(0),
        )?;

        args.push(Box::new(limit));
        args.push(Box::new(offset));

        let sql = format!(
          "SELECT a.client_id, c.name, c.address, c.ssn, a.balance_cents, a.status
           {from}
           {where_clause}
           ORDER BY a.account_id
           LIMIT ? OFFSET ?"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            |row| {
              Ok(RawAccountRecord {
                client_id:        row.get(0)?,
                consumer_name:    row.get(1)?,
                consumer_address: row.get(2)?,
                consumer_ssn:     row.get(3)?,
                balance_cents:    row.get(4)?,
                status:           row.get(5)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((count, rows))
      })
      .await?;

    let results = raws
      .into_iter()
      .map(RawAccountRecord::into_record)
      .collect::<Result<_>>()?;

    Ok(Page {
      count: count as u64,
      results,
    })
  }

  // ── By-id reads ───────────────────────────────────────────────────────────

  async fn get_agency(&self, id: i64) -> Result<Option<Agency>> {
    let raw: Option<RawAgency> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT agency_id, name, reference_no, created_at
               FROM agencies WHERE agency_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawAgency {
                  agency_id:    row.get(0)?,
                  name:         row.get(1)?,
                  reference_no: row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAgency::into_agency).transpose()
  }

  async fn get_client(&self, id: i64) -> Result<Option<Client>> {
    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT client_id, agency_id, name, reference_no, created_at
               FROM clients WHERE client_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawClient {
                  client_id:    row.get(0)?,
                  agency_id:    row.get(1)?,
                  name:         row.get(2)?,
                  reference_no: row.get(3)?,
                  created_at:   row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawClient::into_client).transpose()
  }

  async fn get_consumer(&self, id: i64) -> Result<Option<Consumer>> {
    let raw: Option<RawConsumer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT consumer_id, name, address, ssn, created_at
               FROM consumers WHERE consumer_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawConsumer {
                  consumer_id: row.get(0)?,
                  name:        row.get(1)?,
                  address:     row.get(2)?,
                  ssn:         row.get(3)?,
                  created_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConsumer::into_consumer).transpose()
  }

  // ── Administration ────────────────────────────────────────────────────────

  async fn delete_agency(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM agencies WHERE agency_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn entity_counts(&self) -> Result<EntityCounts> {
    let counts = self
      .conn
      .call(|conn| {
        let one = |sql: &str| -> rusqlite::Result<i64> {
          conn.query_row(sql, [], |row| row.get(0))
        };
        Ok(EntityCounts {
          agencies:  one("SELECT COUNT(*) FROM agencies")? as u64,
          clients:   one("SELECT COUNT(*) FROM clients")? as u64,
          consumers: one("SELECT COUNT(*) FROM consumers")? as u64,
          accounts:  one("SELECT COUNT(*) FROM accounts")? as u64,
        })
      })
      .await?;

    Ok(counts)
  }
}
