//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::utils::{parse_db_timestamp, split_set_specs};

/// A metadata record exposed by the repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Local identifier (without any `oai:<namespace>:` prefix)
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    /// Last modification of the record
    pub last_change: DateTime<Utc>,
    /// Specs of the sets the record belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_specs: Vec<String>,
}

/// A set (collection) in the repository's set hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSet {
    /// Colon-separated hierarchical set spec, e.g. `physics:optics`
    pub spec: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Cache entry stored by the SQLite cache store
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is past its expiration time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Catalog import document
///
/// This is the JSON shape accepted by `Database::import_catalog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub sets: Vec<RecordSet>,
    #[serde(default)]
    pub records: Vec<Record>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for Record {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let subjects_json: String = row.try_get("subjects")?;
        let subjects: Vec<String> = serde_json::from_str(&subjects_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let last_change = parse_db_timestamp(&row.try_get::<String, _>("last_change")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Record {
            identifier: row.try_get("identifier")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            creator: row.try_get("creator")?,
            publisher: row.try_get("publisher")?,
            language: row.try_get("language")?,
            rights: row.try_get("rights")?,
            subjects,
            last_change,
            set_specs: split_set_specs(row.try_get("set_specs")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for RecordSet {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(RecordSet {
            spec: row.try_get("spec")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CacheEntry {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let expires_at = parse_db_timestamp(&row.try_get::<String, _>("expires_at")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let created_at = parse_db_timestamp(&row.try_get::<String, _>("created_at")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(CacheEntry {
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            expires_at,
            created_at,
        })
    }
}
