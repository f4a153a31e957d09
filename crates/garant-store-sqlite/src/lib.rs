//! SQLite backend for the Garant warranty store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Opening a store runs all pending
//! schema migrations; the application must not touch the repositories until
//! that has succeeded.

mod catalog;
mod encode;

pub mod error;
pub mod migrate;
pub mod store;

mod categories;
mod documents;
mod histories;
mod items;
mod notifications;

pub use error::{Error, Result};
pub use items::ItemFilter;
pub use migrate::{Migration, MigrationRunner, VersionLedger};
pub use store::{SqliteStore, StoreOptions};

#[cfg(test)]
mod tests;
