//! Protocol configuration shared across crates
//!
//! The configuration file is loaded by the server binary; these types define
//! the read-only settings the protocol engine runs with.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of items per list response
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default lifetime of a resumption token in seconds
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Error type for parsing a granularity
#[derive(Debug, Clone)]
pub struct ParseGranularityError(String);

impl fmt::Display for ParseGranularityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid granularity: {}", self.0)
    }
}

impl std::error::Error for ParseGranularityError {}

/// Datestamp granularity supported by the repository
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DDThh:mm:ssZ`
    #[default]
    Seconds,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Seconds => "seconds",
        }
    }

    /// The granularity as written in the Identify response
    pub fn oai_pattern(&self) -> &'static str {
        match self {
            Granularity::Day => "YYYY-MM-DD",
            Granularity::Seconds => "YYYY-MM-DDThh:mm:ssZ",
        }
    }

    /// Format a datestamp at this granularity
    pub fn format_datestamp(&self, dt: &DateTime<Utc>) -> String {
        match self {
            Granularity::Day => dt.format("%Y-%m-%d").to_string(),
            Granularity::Seconds => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Whether a request argument at `requested` granularity is acceptable
    pub fn accepts(&self, requested: Granularity) -> bool {
        match self {
            Granularity::Seconds => true,
            Granularity::Day => requested == Granularity::Day,
        }
    }
}

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "seconds" => Ok(Granularity::Seconds),
            _ => Err(ParseGranularityError(s.to_string())),
        }
    }
}

/// Settings the protocol engine is built with
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Public URL of the OAI-PMH endpoint, echoed in every response
    pub base_url: String,
    /// Namespace used in OAI identifiers (`oai:<namespace>:<local id>`)
    pub identifier_namespace: String,
    /// Finest datestamp granularity the repository supports
    pub granularity: Granularity,
    /// Maximum number of items in one list response
    pub page_size: usize,
    /// Lifetime of a resumption token
    pub token_ttl: Duration,
}

impl ProtocolConfig {
    /// Build the OAI identifier of a record from its local identifier
    pub fn oai_identifier(&self, local_id: &str) -> String {
        format!("oai:{}:{}", self.identifier_namespace, local_id)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/oai".to_string(),
            identifier_namespace: "localhost".to_string(),
            granularity: Granularity::default(),
            page_size: DEFAULT_PAGE_SIZE,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}
