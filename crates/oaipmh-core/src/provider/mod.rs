//! Record provider contract
//!
//! The engine reads repository metadata, records and sets exclusively through
//! `RecordProvider`. `SqliteProvider` serves the imported catalog;
//! `MemoryProvider` holds a fixed list and backs tests.

mod memory;
mod sqlite;

pub use memory::MemoryProvider;
pub use sqlite::{RepositoryInfo, SqliteProvider};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oaipmh_db::{Record, RecordSet};
use thiserror::Error;

use crate::dublin_core::DublinCore;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Database error: {0}")]
    Database(#[from] oaipmh_db::DbError),

    #[error("Invalid provider data: {0}")]
    InvalidData(String),
}

/// Source of everything the repository exposes
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// Human-readable repository name
    async fn repository_name(&self) -> Result<String, ProviderError>;

    /// Administrator contact address
    async fn admin_email(&self) -> Result<String, ProviderError>;

    /// Lower bound of all record datestamps
    async fn earliest_datestamp(&self) -> Result<DateTime<Utc>, ProviderError>;

    /// Look up a record by local identifier
    async fn get_record(&self, id: &str) -> Result<Option<Record>, ProviderError>;

    /// Records in the given set (including sub-sets) changed within the bounds
    async fn get_records(
        &self,
        set: Option<&str>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Record>, ProviderError>;

    /// All sets, in a stable order
    async fn get_sets(&self) -> Result<Vec<RecordSet>, ProviderError>;

    /// Sets a record directly belongs to
    async fn sets_for_record(&self, record: &Record) -> Result<Vec<RecordSet>, ProviderError>;

    /// Whether the repository has a set hierarchy
    async fn supports_sets(&self) -> Result<bool, ProviderError>;

    /// Number of records in the catalog
    async fn record_count(&self) -> Result<usize, ProviderError>;

    fn record_id(&self, record: &Record) -> String {
        record.identifier.clone()
    }

    fn record_updated(&self, record: &Record) -> DateTime<Utc> {
        record.last_change
    }

    fn dublinize(&self, record: &Record) -> DublinCore {
        DublinCore::from_record(record)
    }
}

/// Whether a record in set `spec` is a member of the requested set
///
/// Membership is hierarchical: `physics:optics` is inside `physics`.
pub fn set_spec_matches(requested: &str, spec: &str) -> bool {
    spec == requested
        || spec
            .strip_prefix(requested)
            .is_some_and(|rest| rest.starts_with(':'))
}
