//! Handler for `GET /accounts`, the filtered, paginated account listing.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use recoup_core::{
  entity::AccountStatus,
  store::{AccountQuery, AccountRecord, AccountStore, Page},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ApiError;

/// Query parameters for the listing endpoint. All optional; supplied
/// filters combine conjunctively.
///
/// `status` only deserialises the three canonical literals: an unknown
/// value is rejected with 400 before it reaches the store, as are
/// non-decimal balance bounds.
#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub min_balance:   Option<Decimal>,
  pub max_balance:   Option<Decimal>,
  pub consumer_name: Option<String>,
  pub status:        Option<AccountStatus>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

/// `GET /accounts[?min_balance=...][&max_balance=...][&consumer_name=...][&status=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<AccountRecord>>, ApiError>
where
  S: AccountStore,
{
  let query = AccountQuery {
    min_balance:   params.min_balance,
    max_balance:   params.max_balance,
    consumer_name: params.consumer_name,
    status:        params.status,
    limit:         params.limit,
    offset:        params.offset,
  };

  let page = store
    .list_accounts(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(page))
}
