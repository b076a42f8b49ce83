//! Set operations

use sqlx::Row;

use crate::error::DbError;
use crate::models::RecordSet;
use crate::repository::Database;

impl Database {
    // ==================== Set Operations ====================

    /// Insert a set or replace the existing one with the same spec
    pub async fn upsert_set(&self, set: &RecordSet) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO sets (spec, name, description)
            VALUES (?, ?, ?)
            ON CONFLICT(spec) DO UPDATE SET name = excluded.name, description = excluded.description
            "#,
        )
        .bind(&set.spec)
        .bind(&set.name)
        .bind(&set.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List all sets ordered by spec
    pub async fn list_sets(&self) -> Result<Vec<RecordSet>, DbError> {
        let rows = sqlx::query("SELECT spec, name, description FROM sets ORDER BY spec")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| RecordSet::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List the sets a record is a direct member of
    pub async fn sets_for_record(&self, identifier: &str) -> Result<Vec<RecordSet>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT s.spec, s.name, s.description
            FROM sets s
            JOIN record_sets rs ON rs.set_spec = s.spec
            WHERE rs.record_identifier = ?
            ORDER BY s.spec
            "#,
        )
        .bind(identifier)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| RecordSet::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Count all sets
    pub async fn count_sets(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM sets")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}
