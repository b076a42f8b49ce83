//! Database repository implementation

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::error::DbError;
use crate::models::Catalog;

// Submodules
mod cache;
mod records;
mod sets;

pub use records::RecordQuery;

/// Catalog size summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub record_count: i64,
    pub set_count: i64,
}

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let pool = SqlitePool::connect(database_url).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create a private in-memory database
    ///
    /// The pool is limited to one connection so every query sees the same
    /// in-memory database.
    pub async fn in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        // Create tables if they don't exist
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                identifier TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                creator TEXT,
                publisher TEXT,
                language TEXT,
                rights TEXT,
                subjects TEXT NOT NULL DEFAULT '[]',
                last_change TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_records_last_change ON records(last_change)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sets (
                spec TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS record_sets (
                record_identifier TEXT NOT NULL,
                set_spec TEXT NOT NULL,
                PRIMARY KEY (record_identifier, set_spec)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_record_sets_set_spec ON record_sets(set_spec)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    // ==================== Catalog Operations ====================

    /// Import sets and records, replacing entries with the same key
    pub async fn import_catalog(&self, catalog: &Catalog) -> Result<CatalogStats, DbError> {
        info!(
            "Importing catalog ({} sets, {} records)",
            catalog.sets.len(),
            catalog.records.len()
        );

        for set in &catalog.sets {
            self.upsert_set(set).await?;
        }
        for record in &catalog.records {
            self.upsert_record(record).await?;
        }

        self.catalog_stats().await
    }

    /// Count records and sets
    pub async fn catalog_stats(&self) -> Result<CatalogStats, DbError> {
        Ok(CatalogStats {
            record_count: self.count_records().await?,
            set_count: self.count_sets().await?,
        })
    }
}
