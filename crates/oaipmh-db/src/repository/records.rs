//! Record operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::models::Record;
use crate::repository::Database;
use crate::utils::{parse_db_timestamp, to_db_timestamp};

/// Filters for listing records
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Set spec; members of descendant sets match as well
    pub set: Option<String>,
    /// Inclusive lower bound on `last_change`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `last_change`
    pub until: Option<DateTime<Utc>>,
}

const RECORD_COLUMNS: &str = r#"
    r.identifier, r.title, r.description, r.creator, r.publisher, r.language, r.rights,
    r.subjects, r.last_change,
    (SELECT GROUP_CONCAT(rs.set_spec, char(31))
       FROM record_sets rs
      WHERE rs.record_identifier = r.identifier) AS set_specs
"#;

impl Database {
    // ==================== Record Operations ====================

    /// Insert a record or replace the existing one with the same identifier
    pub async fn upsert_record(&self, record: &Record) -> Result<(), DbError> {
        let subjects = serde_json::to_string(&record.subjects)
            .map_err(|e| DbError::InvalidData(format!("subjects: {}", e)))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO records (identifier, title, description, creator, publisher, language, rights, subjects, last_change)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(identifier) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                creator = excluded.creator,
                publisher = excluded.publisher,
                language = excluded.language,
                rights = excluded.rights,
                subjects = excluded.subjects,
                last_change = excluded.last_change
            "#,
        )
        .bind(&record.identifier)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.creator)
        .bind(&record.publisher)
        .bind(&record.language)
        .bind(&record.rights)
        .bind(subjects)
        .bind(to_db_timestamp(&record.last_change))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM record_sets WHERE record_identifier = ?")
            .bind(&record.identifier)
            .execute(&mut *tx)
            .await?;

        for spec in &record.set_specs {
            sqlx::query(
                "INSERT OR IGNORE INTO record_sets (record_identifier, set_spec) VALUES (?, ?)",
            )
            .bind(&record.identifier)
            .bind(spec)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a record by its local identifier
    pub async fn get_record(&self, identifier: &str) -> Result<Option<Record>, DbError> {
        let sql = format!(
            "SELECT {} FROM records r WHERE r.identifier = ?",
            RECORD_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Record::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List records matching the query, oldest change first
    pub async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>, DbError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM records r
            WHERE (?1 IS NULL OR EXISTS (
                    SELECT 1 FROM record_sets m
                     WHERE m.record_identifier = r.identifier
                       AND (m.set_spec = ?1 OR substr(m.set_spec, 1, length(?1) + 1) = ?1 || ':')))
              AND (?2 IS NULL OR r.last_change >= ?2)
              AND (?3 IS NULL OR r.last_change <= ?3)
            ORDER BY r.last_change ASC, r.identifier ASC
            "#,
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(query.set.as_deref())
            .bind(query.from.as_ref().map(to_db_timestamp))
            .bind(query.until.as_ref().map(to_db_timestamp))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Record::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Oldest `last_change` in the catalog
    pub async fn earliest_datestamp(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        let row = sqlx::query("SELECT MIN(last_change) AS earliest FROM records")
            .fetch_one(&self.pool)
            .await?;
        let earliest: Option<String> = row.try_get("earliest")?;
        earliest.as_deref().map(parse_db_timestamp).transpose()
    }

    /// Count all records
    pub async fn count_records(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}
