//! # Harvest Database Crate
//!
//! This crate is the application's interface to its SQLite database: accounts,
//! login sessions and the append-only table of market-data submissions.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Adapter:** All SQL lives here. Callers see `DbRepository` methods
//!   and plain `core-types` structs, never rows or statements.
//! - **Embedded Schema:** Migrations under `migrations/` are compiled into the
//!   binary and applied with `run_migrations`.
//! - **Asynchronous & Pooled:** Every operation is async over a `SqlitePool`.
//!
//! ## Public API
//!
//! - `connect` / `connect_in_memory`: open a pool.
//! - `run_migrations` / `reset_database`: bring the schema up to date, or rebuild it.
//! - `list_tables` / `table_columns`: schema inspection.
//! - `DbRepository`: the data access methods.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{
    ColumnInfo, connect, connect_in_memory, list_tables, reset_database, run_migrations,
    table_columns,
};
pub use error::DbError;
pub use repository::DbRepository;
pub use sqlx::sqlite::SqlitePool;
