//! Core types and trait definitions for the recoup account store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod entity;
pub mod reconcile;
pub mod store;
