//! In-memory record provider

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use oaipmh_db::{Record, RecordSet};

use super::{ProviderError, RecordProvider, set_spec_matches};

/// Provider over a fixed list of records and sets
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    name: String,
    admin_email: String,
    records: Vec<Record>,
    sets: Vec<RecordSet>,
    supports_sets: Option<bool>,
}

impl MemoryProvider {
    pub fn new(name: impl Into<String>, admin_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin_email: admin_email.into(),
            records: Vec::new(),
            sets: Vec::new(),
            supports_sets: None,
        }
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn with_sets(mut self, sets: Vec<RecordSet>) -> Self {
        self.sets = sets;
        self
    }

    /// Override set support, which otherwise follows whether sets exist
    pub fn with_set_support(mut self, supported: bool) -> Self {
        self.supports_sets = Some(supported);
        self
    }
}

#[async_trait]
impl RecordProvider for MemoryProvider {
    async fn repository_name(&self) -> Result<String, ProviderError> {
        Ok(self.name.clone())
    }

    async fn admin_email(&self) -> Result<String, ProviderError> {
        Ok(self.admin_email.clone())
    }

    async fn earliest_datestamp(&self) -> Result<DateTime<Utc>, ProviderError> {
        Ok(self
            .records
            .iter()
            .map(datestamp)
            .min()
            .unwrap_or(DateTime::UNIX_EPOCH))
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, ProviderError> {
        Ok(self.records.iter().find(|r| r.identifier == id).cloned())
    }

    async fn get_records(
        &self,
        set: Option<&str>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Record>, ProviderError> {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| {
                set.is_none_or(|set| r.set_specs.iter().any(|spec| set_spec_matches(set, spec)))
            })
            .filter(|r| from.is_none_or(|from| datestamp(r) >= from))
            .filter(|r| until.is_none_or(|until| datestamp(r) <= until))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            datestamp(a)
                .cmp(&datestamp(b))
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        Ok(records)
    }

    async fn get_sets(&self) -> Result<Vec<RecordSet>, ProviderError> {
        Ok(self.sets.clone())
    }

    async fn sets_for_record(&self, record: &Record) -> Result<Vec<RecordSet>, ProviderError> {
        Ok(self
            .sets
            .iter()
            .filter(|set| record.set_specs.contains(&set.spec))
            .cloned()
            .collect())
    }

    async fn supports_sets(&self) -> Result<bool, ProviderError> {
        Ok(self.supports_sets.unwrap_or(!self.sets.is_empty()))
    }

    async fn record_count(&self) -> Result<usize, ProviderError> {
        Ok(self.records.len())
    }
}

/// Record datestamp at the second precision harvest bounds are given in
fn datestamp(record: &Record) -> DateTime<Utc> {
    record.last_change.trunc_subsecs(0)
}
