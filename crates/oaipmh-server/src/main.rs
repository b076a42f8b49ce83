//! OAI-PMH Server - data-provider side of the OAI-PMH 2.0 protocol

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{CacheBackend, Config, LoggingConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use oaipmh_api::{AppState, create_router};
use oaipmh_core::{ProtocolEngine, RepositoryInfo, SqliteProvider};
use oaipmh_db::{Catalog, Database};
use oaipmh_store::{CacheStore, MemoryStore, SqliteStore, spawn_purge_task};

/// OAI-PMH Server - serves a record catalog to OAI-PMH harvesters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "OAIPMH_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "OAIPMH_PORT")]
    port: Option<u16>,

    /// JSON catalog to import before serving
    #[arg(long)]
    import: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting OAI-PMH Server v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;

    if let Some(path) = &args.import {
        import_catalog(&db, path).await?;
    }

    let stats = db.catalog_stats().await?;
    info!(
        "Catalog holds {} records in {} sets",
        stats.record_count, stats.set_count
    );

    // Initialize record provider
    let provider = Arc::new(SqliteProvider::new(
        db.clone(),
        RepositoryInfo {
            name: config.repository.name.clone(),
            admin_email: config.repository.admin_email.clone(),
            earliest_datestamp: config.repository.earliest_datestamp,
        },
    ));

    // Initialize cache store
    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
        CacheBackend::Sqlite => Arc::new(SqliteStore::new(db.clone())),
    };
    let purge_task = spawn_purge_task(store.clone(), config.cache.purge_interval_secs);

    let engine = Arc::new(ProtocolEngine::new(
        provider,
        store,
        config.protocol_config(),
    ));

    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let app = create_router(AppState::new(engine), metrics_handle)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);
    info!("Base URL: {}", config.repository.base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    info!("Server stopped");
    Ok(())
}

/// Load a JSON catalog file into the database
async fn import_catalog(db: &Database, path: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog file: {}", path))?;
    let catalog: Catalog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path))?;

    let stats = db.import_catalog(&catalog).await?;
    info!(
        "Imported {} records and {} sets from {}",
        stats.record_count, stats.set_count, path
    );
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
