//! Command-line and environment configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MI_DB_URI` | mongodb://127.0.0.1:27017/movinin?authSource=admin&appName=movinin | Connection URI |
//! | `MI_DB_SSL` | false | Connect over TLS |
//! | `MI_DB_SSL_CERT` | | Client certificate and key file |
//! | `MI_DB_SSL_CA` | | Certificate authority file |
//! | `MI_DB_DEBUG` | false | Trace every store operation |
//! | `MI_LANGUAGES` | en,fr,es | Supported languages (comma-separated) |
//! | `MI_BOOKING_EXPIRE_AT` | 86400 | Unpaid booking expiry (seconds) |
//! | `MI_USER_EXPIRE_AT` | 345600 | Unverified user expiry (seconds) |
//! | `MI_TOKEN_EXPIRE_AT` | 86400 | Auth token expiry (seconds) |
//! | `MI_DB_PROVISION_RETRIES` | 3 | Attempts per collection |
//! | `MI_DB_PROVISION_BASE_DELAY` | 500ms | First retry delay |
//! | `MI_DB_RECLAIM_ORPHANS` | true | Delete unreferenced location values |
//! | `MI_LOG_LEVEL` | info | Log level |

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use movinin_persistence::DatabaseConfig;

/// Bootstrap configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "movinin-bootstrap")]
#[command(about = "Provision and reconcile the Movin' In database")]
pub struct BootstrapConfig {
    /// Database connection URI, including the database name.
    #[arg(
        long,
        env = "MI_DB_URI",
        default_value = "mongodb://127.0.0.1:27017/movinin?authSource=admin&appName=movinin"
    )]
    pub db_uri: String,

    /// Connect over TLS.
    #[arg(long, env = "MI_DB_SSL", default_value = "false")]
    pub db_ssl: bool,

    /// Client certificate and key file.
    #[arg(long, env = "MI_DB_SSL_CERT")]
    pub db_ssl_cert: Option<PathBuf>,

    /// Certificate authority file.
    #[arg(long, env = "MI_DB_SSL_CA")]
    pub db_ssl_ca: Option<PathBuf>,

    /// Trace every store operation.
    #[arg(long, env = "MI_DB_DEBUG", default_value = "false")]
    pub db_debug: bool,

    /// Supported languages (comma-separated).
    #[arg(long, env = "MI_LANGUAGES", value_delimiter = ',', default_value = "en,fr,es")]
    pub languages: Vec<String>,

    /// Seconds before an unpaid booking expires.
    #[arg(long, env = "MI_BOOKING_EXPIRE_AT", default_value = "86400")]
    pub booking_expire_at: u64,

    /// Seconds before an unverified user expires.
    #[arg(long, env = "MI_USER_EXPIRE_AT", default_value = "345600")]
    pub user_expire_at: u64,

    /// Seconds before an auth token expires.
    #[arg(long, env = "MI_TOKEN_EXPIRE_AT", default_value = "86400")]
    pub token_expire_at: u64,

    /// Attempts per collection before provisioning fails.
    #[arg(long, env = "MI_DB_PROVISION_RETRIES", default_value = "3")]
    pub provision_retries: u32,

    /// Delay before the second provisioning attempt (e.g. 500ms, 2s).
    #[arg(
        long,
        env = "MI_DB_PROVISION_BASE_DELAY",
        default_value = "500ms",
        value_parser = humantime::parse_duration
    )]
    pub provision_base_delay: Duration,

    /// Delete location values no location or country references.
    #[arg(long, env = "MI_DB_RECLAIM_ORPHANS", default_value = "true", action = clap::ArgAction::Set)]
    pub reclaim_orphans: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "MI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl BootstrapConfig {
    /// Converts into the library configuration.
    pub fn into_database_config(self) -> DatabaseConfig {
        DatabaseConfig {
            uri: self.db_uri,
            ssl: self.db_ssl,
            ssl_cert: self.db_ssl_cert,
            ssl_ca: self.db_ssl_ca,
            debug: self.db_debug,
            languages: self
                .languages
                .into_iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
            booking_expire_at: self.booking_expire_at,
            user_expire_at: self.user_expire_at,
            token_expire_at: self.token_expire_at,
            provision_retries: self.provision_retries,
            provision_base_delay: self.provision_base_delay,
            reclaim_orphan_values: self.reclaim_orphans,
        }
    }

    /// Whether the URI targets the in-memory backend.
    pub fn is_memory(&self) -> bool {
        self.db_uri.starts_with("memory://")
    }
}
