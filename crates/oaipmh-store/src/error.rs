//! Cache store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] oaipmh_db::DbError),

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),
}
