//! JSON REST API for recoup.
//!
//! Exposes an axum [`Router`] backed by any
//! [`recoup_core::store::AccountStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", recoup_api::api_router(store.clone()))
//! ```

pub mod accounts;
pub mod error;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use recoup_core::store::AccountStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/accounts", get(accounts::list::<S>))
    .route("/upload-csv", post(upload::upload_csv::<S>))
    .with_state(store)
}
