//! OAI-PMH Server Database Layer
//!
//! This crate provides the persistence layer behind the record catalog and
//! the SQLite cache store, using SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{CatalogStats, Database, RecordQuery};
