//! Clinic DB — SurrealDB connection management, schema migrations,
//! repository implementations and the inventory ledger.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Implementations of the `clinic-core` repository traits ([`repository`])
//! - The sale transaction ([`SurrealInventoryLedger`])

mod connection;
mod error;
pub mod ledger;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use ledger::{LedgerConfig, RowLocks, SurrealInventoryLedger};
pub use schema::{run_migrations, schema_v1};
