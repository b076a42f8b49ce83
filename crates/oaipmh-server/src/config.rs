//! Configuration loading and validation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use oaipmh_core::{Granularity, ProtocolConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Repository identity, answered by Identify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Public URL of the `/oai` endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Namespace part of OAI identifiers (`oai:<namespace>:<id>`)
    #[serde(default = "default_identifier_namespace")]
    pub identifier_namespace: String,
    #[serde(default)]
    pub granularity: Granularity,
    /// Overrides the earliest datestamp derived from the catalog
    #[serde(default)]
    pub earliest_datestamp: Option<DateTime<Utc>>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: default_repository_name(),
            admin_email: default_admin_email(),
            base_url: default_base_url(),
            identifier_namespace: default_identifier_namespace(),
            granularity: Granularity::default(),
            earliest_datestamp: None,
        }
    }
}

/// Minimum allowed resumption token lifetime (1 minute)
const MIN_TOKEN_TTL_SECS: u64 = 60;

/// Maximum allowed resumption token lifetime (24 hours)
const MAX_TOKEN_TTL_SECS: u64 = 86400;

/// List paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Maximum number of items per list response
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Lifetime of a resumption token in seconds
    ///
    /// Valid range: 60-86400 seconds. Default: 3600 seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl HarvestConfig {
    /// Page size, at least 1
    pub fn validated_page_size(&self) -> usize {
        if self.page_size == 0 {
            warn!("page_size 0 is not allowed, using 1");
            1
        } else {
            self.page_size
        }
    }

    /// Token lifetime clamped to [60, 86400] seconds
    pub fn validated_token_ttl_secs(&self) -> u64 {
        if self.token_ttl_secs < MIN_TOKEN_TTL_SECS {
            warn!(
                "token_ttl_secs {} is below minimum {}, using minimum",
                self.token_ttl_secs, MIN_TOKEN_TTL_SECS
            );
            MIN_TOKEN_TTL_SECS
        } else if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            warn!(
                "token_ttl_secs {} exceeds maximum {}, using maximum",
                self.token_ttl_secs, MAX_TOKEN_TTL_SECS
            );
            MAX_TOKEN_TTL_SECS
        } else {
            self.token_ttl_secs
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Where resumption state is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_repository_name() -> String {
    "OAI-PMH Repository".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/oai".to_string()
}

fn default_identifier_namespace() -> String {
    "localhost".to_string()
}

fn default_page_size() -> usize {
    oaipmh_core::config::DEFAULT_PAGE_SIZE
}

fn default_token_ttl_secs() -> u64 {
    oaipmh_core::config::DEFAULT_TOKEN_TTL_SECS
}

fn default_purge_interval_secs() -> u64 {
    300
}

fn default_db_path() -> String {
    "./data/oaipmh.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.validate()?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject settings the repository cannot run with
    pub fn validate(&self) -> Result<()> {
        let base_url = url::Url::parse(&self.repository.base_url).with_context(|| {
            format!("Invalid repository.base_url: {}", self.repository.base_url)
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!(
                "repository.base_url must be an http(s) URL, got {}",
                self.repository.base_url
            );
        }
        if !self.repository.admin_email.contains('@') {
            anyhow::bail!(
                "repository.admin_email is not an email address: {}",
                self.repository.admin_email
            );
        }
        if self.repository.identifier_namespace.is_empty()
            || self.repository.identifier_namespace.contains(':')
        {
            anyhow::bail!(
                "repository.identifier_namespace must be non-empty and contain no ':'"
            );
        }
        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            base_url: self.repository.base_url.clone(),
            identifier_namespace: self.repository.identifier_namespace.clone(),
            granularity: self.repository.granularity,
            page_size: self.harvest.validated_page_size(),
            token_ttl: Duration::from_secs(self.harvest.validated_token_ttl_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.harvest.page_size, 50);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[server]
bind_address = "127.0.0.1"
port = 9000

[repository]
name = "Physics Archive"
admin_email = "curator@physics.example.org"
base_url = "https://physics.example.org/oai"
identifier_namespace = "physics.example.org"
granularity = "day"
earliest_datestamp = "1990-01-01T00:00:00Z"

[harvest]
page_size = 25
token_ttl_secs = 600

[cache]
backend = "sqlite"
purge_interval_secs = 60

[logging]
level = "debug"
format = "json"
"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.repository.granularity, Granularity::Day);
        assert!(config.repository.earliest_datestamp.is_some());
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(config.logging.format, "json");

        let protocol = config.protocol_config();
        assert_eq!(protocol.page_size, 25);
        assert_eq!(protocol.token_ttl, Duration::from_secs(600));
        assert_eq!(protocol.identifier_namespace, "physics.example.org");
    }

    #[test]
    fn test_harvest_limits_are_clamped() {
        let harvest = HarvestConfig {
            page_size: 0,
            token_ttl_secs: 5,
        };
        assert_eq!(harvest.validated_page_size(), 1);
        assert_eq!(harvest.validated_token_ttl_secs(), 60);

        let harvest = HarvestConfig {
            page_size: 10,
            token_ttl_secs: 1_000_000,
        };
        assert_eq!(harvest.validated_token_ttl_secs(), 86400);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let file = write_config(
            r#"
[repository]
base_url = "not a url"
"#,
        );
        assert!(Config::load(file.path().to_str().unwrap()).is_err());

        let mut config = Config::default();
        config.repository.base_url = "ftp://example.org/oai".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.repository.identifier_namespace = "a:b".to_string();
        assert!(config.validate().is_err());
    }
}
