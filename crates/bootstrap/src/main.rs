//! Movin' In database bootstrap.
//!
//! Connects to the database, brings collections, indexes, and multilingual
//! reference data in line with the configuration, and exits non-zero when
//! anything went wrong.

mod config;

use std::sync::Arc;

use clap::Parser;
use movinin_persistence::backends::memory::MemoryConnector;
use movinin_persistence::{ConnectionManager, Connector, DatabaseConfig, Initializer};
use tracing::{error, info};

use crate::config::BootstrapConfig;

/// Installs the tracing subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "movinin_persistence={},movinin_bootstrap={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Picks the connector for the configured URI.
fn create_connector(memory: bool) -> anyhow::Result<Arc<dyn Connector>> {
    if memory {
        info!("Using the in-memory backend");
        return Ok(Arc::new(MemoryConnector::default()));
    }
    mongodb_connector()
}

#[cfg(feature = "mongodb")]
fn mongodb_connector() -> anyhow::Result<Arc<dyn Connector>> {
    use movinin_persistence::backends::mongodb::MongoConnector;
    Ok(Arc::new(MongoConnector::new()))
}

/// Fallback when the mongodb feature is not enabled.
#[cfg(not(feature = "mongodb"))]
fn mongodb_connector() -> anyhow::Result<Arc<dyn Connector>> {
    anyhow::bail!(
        "The MongoDB backend requires the 'mongodb' feature. \
         Build with: cargo build -p movinin-bootstrap --features mongodb"
    )
}

async fn run(connector: Arc<dyn Connector>, config: &DatabaseConfig) -> bool {
    let connection = ConnectionManager::from_config(connector, config);
    if !connection.connect(&config.uri, config.ssl, config.debug).await {
        return false;
    }

    let initialized = Initializer::new(&connection, config).initialize().await;

    if let Err(e) = connection.close(false).await {
        error!(error = %e, "Failed to close the database connection");
    }
    initialized
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BootstrapConfig::parse();
    init_logging(&args.log_level);

    let memory = args.is_memory();
    let config = args.into_database_config();
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        languages = ?config.languages,
        ssl = config.ssl,
        debug = config.debug,
        "Starting Movin' In database bootstrap"
    );

    let connector = create_connector(memory)?;
    if !run(connector, &config).await {
        error!("Database bootstrap failed");
        std::process::exit(1);
    }

    info!("Database bootstrap complete");
    Ok(())
}
