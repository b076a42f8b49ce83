//! Record provider backed by the imported SQLite catalog

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oaipmh_db::{Database, Record, RecordQuery, RecordSet};
use tracing::debug;

use super::{ProviderError, RecordProvider};

/// Descriptive repository metadata that is not stored in the catalog
#[derive(Debug, Clone)]
pub struct RepositoryInfo {
    pub name: String,
    pub admin_email: String,
    /// Overrides the earliest datestamp computed from the catalog
    pub earliest_datestamp: Option<DateTime<Utc>>,
}

/// Provider reading records and sets from the database
#[derive(Clone)]
pub struct SqliteProvider {
    db: Database,
    info: RepositoryInfo,
}

impl SqliteProvider {
    pub fn new(db: Database, info: RepositoryInfo) -> Self {
        Self { db, info }
    }
}

#[async_trait]
impl RecordProvider for SqliteProvider {
    async fn repository_name(&self) -> Result<String, ProviderError> {
        Ok(self.info.name.clone())
    }

    async fn admin_email(&self) -> Result<String, ProviderError> {
        Ok(self.info.admin_email.clone())
    }

    async fn earliest_datestamp(&self) -> Result<DateTime<Utc>, ProviderError> {
        if let Some(earliest) = self.info.earliest_datestamp {
            return Ok(earliest);
        }
        Ok(self
            .db
            .earliest_datestamp()
            .await?
            .unwrap_or(DateTime::UNIX_EPOCH))
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, ProviderError> {
        Ok(self.db.get_record(id).await?)
    }

    async fn get_records(
        &self,
        set: Option<&str>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Record>, ProviderError> {
        let query = RecordQuery {
            set: set.map(str::to_string),
            from,
            until,
        };
        let records = self.db.list_records(&query).await?;
        debug!("Catalog query {:?} matched {} records", query, records.len());
        Ok(records)
    }

    async fn get_sets(&self) -> Result<Vec<RecordSet>, ProviderError> {
        Ok(self.db.list_sets().await?)
    }

    async fn sets_for_record(&self, record: &Record) -> Result<Vec<RecordSet>, ProviderError> {
        Ok(self.db.sets_for_record(&record.identifier).await?)
    }

    async fn supports_sets(&self) -> Result<bool, ProviderError> {
        Ok(self.db.count_sets().await? > 0)
    }

    async fn record_count(&self) -> Result<usize, ProviderError> {
        let count = self.db.count_records().await?;
        usize::try_from(count)
            .map_err(|_| ProviderError::InvalidData(format!("Invalid record count {}", count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use oaipmh_db::Catalog;

    fn info(earliest: Option<DateTime<Utc>>) -> RepositoryInfo {
        RepositoryInfo {
            name: "Catalog".to_string(),
            admin_email: "admin@example.org".to_string(),
            earliest_datestamp: earliest,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            sets: vec![RecordSet {
                spec: "physics".to_string(),
                name: "Physics".to_string(),
                description: None,
            }],
            records: vec![Record {
                identifier: "42".to_string(),
                title: "Answer".to_string(),
                description: String::new(),
                creator: None,
                publisher: None,
                language: None,
                rights: None,
                subjects: vec![],
                last_change: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
                set_specs: vec!["physics:optics".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_reads_catalog() {
        let db = Database::in_memory().await.unwrap();
        db.import_catalog(&catalog()).await.unwrap();
        let provider = SqliteProvider::new(db, info(None));

        assert!(provider.supports_sets().await.unwrap());
        assert_eq!(provider.record_count().await.unwrap(), 1);
        assert_eq!(provider.repository_name().await.unwrap(), "Catalog");
        assert_eq!(
            provider.earliest_datestamp().await.unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(provider.get_record("42").await.unwrap().is_some());
        assert_eq!(
            provider
                .get_records(Some("physics"), None, None)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let override_date = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let db = Database::in_memory().await.unwrap();
        let provider = SqliteProvider::new(db.clone(), info(Some(override_date)));
        assert!(!provider.supports_sets().await.unwrap());
        assert_eq!(provider.record_count().await.unwrap(), 0);
        assert_eq!(provider.earliest_datestamp().await.unwrap(), override_date);

        let provider = SqliteProvider::new(db, info(None));
        assert_eq!(
            provider.earliest_datestamp().await.unwrap(),
            DateTime::UNIX_EPOCH
        );
    }
}
