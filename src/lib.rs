//! VOD gateway library
//!
//! Delivery and observability pipeline for a video catalog:
//!
//! - **auth**: purpose-scoped capability tokens (short-lived stream grants,
//!   multi-day admin session tokens)
//! - **web**: the HTTP surface, including the range-preserving byte relay
//!   and the live metrics SSE channel
//! - **services**: analytics ingestion, trending reconciliation, and
//!   metrics aggregation over the shared store
//! - **database**: SQLite access, migrations, and the advisory lock that
//!   serializes trending recomputes
//!
//! The binary in `main.rs` wires configuration, the database, and the web
//! server together; everything else is reachable from this crate root for
//! integration tests.

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod services;
pub mod web;

pub use errors::{AppError, AppResult};
