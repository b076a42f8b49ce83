//! OAI-PMH Server Cache Store Layer
//!
//! This crate provides the key/value cache abstraction that holds in-flight
//! list cursors, with in-memory and SQLite-backed implementations.

pub mod backend;
pub mod error;
pub mod memory;
pub mod purge;
pub mod sqlite;

pub use backend::CacheStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use purge::spawn_purge_task;
pub use sqlite::SqliteStore;
