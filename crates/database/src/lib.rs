//! # Lineup Analytics Database Crate
//!
//! This crate defines the persistence boundary of the analytics system and its
//! PostgreSQL implementation. It reads raw lineup results and archives the
//! derived reports, analyses and predictions.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** The `DataStore` trait is the only thing the worker sees.
//!   `PgDataStore` encapsulates all SQL and row mapping behind it, so tests can
//!   substitute an in-memory store.
//! - **Runtime-checked queries:** Queries are plain `sqlx::query` calls with bound
//!   parameters, so the crate builds without a live database.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share a
//!   connection pool (`PgPool`).
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded migrations.
//! - `DataStore`: The persistence operations the worker depends on.
//! - `PgDataStore`: The PostgreSQL implementation of `DataStore`.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::PgDataStore;
pub use store::DataStore;
