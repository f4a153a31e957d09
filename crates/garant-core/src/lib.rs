//! Core domain types for the Garant warranty keeper.
//!
//! This crate is deliberately free of database dependencies: just the
//! entity types, their invariants, and the warranty-duration grammar. The
//! SQLite backend (`garant-store-sqlite`) builds on top of it.

pub mod category;
pub mod document;
pub mod error;
pub mod history;
pub mod id;
pub mod item;
pub mod notification;
pub mod owner;
pub mod warranty;

pub use error::{Error, Result};
