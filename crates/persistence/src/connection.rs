//! Connection lifecycle.
//!
//! The [`ConnectionManager`] owns the single shared store handle of the
//! process. Connecting twice is a no-op; closing is always safe and always
//! leaves the manager disconnected.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::core::{ConnectOptions, Connector, DocumentStore, TracingStore};
use crate::error::{BackendError, ConnectionError};

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No open handle.
    Disconnected,
    /// A handle is open and usable.
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Owns the store connection and its state.
#[derive(Debug)]
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    ssl_cert: Option<PathBuf>,
    ssl_ca: Option<PathBuf>,
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
}

impl ConnectionManager {
    /// Creates a disconnected manager without TLS material.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            ssl_cert: None,
            ssl_ca: None,
            store: RwLock::new(None),
        }
    }

    /// Creates a disconnected manager using the TLS paths of `config`.
    pub fn from_config(connector: Arc<dyn Connector>, config: &DatabaseConfig) -> Self {
        Self::new(connector).with_tls_files(config.ssl_cert.clone(), config.ssl_ca.clone())
    }

    /// Sets the certificate and CA files used when connecting with TLS.
    pub fn with_tls_files(mut self, cert: Option<PathBuf>, ca: Option<PathBuf>) -> Self {
        self.ssl_cert = cert;
        self.ssl_ca = ca;
        self
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        if self.store.read().is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Whether a handle is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns the open handle.
    pub fn store(&self) -> Result<Arc<dyn DocumentStore>, ConnectionError> {
        self.store.read().clone().ok_or(ConnectionError::NotConnected)
    }

    /// Opens the connection.
    ///
    /// Returns `true` immediately when already connected. Failures are logged
    /// and reported as `false`; the manager stays disconnected.
    pub async fn connect(&self, uri: &str, use_tls: bool, debug_logging: bool) -> bool {
        if self.is_connected() {
            return true;
        }

        let options = match self.connect_options(use_tls, debug_logging) {
            Ok(options) => options,
            Err(message) => {
                error!(error = %message, "Cannot connect to the database");
                return false;
            }
        };

        let store = match self.connector.connect(uri, &options).await {
            Ok(store) => store,
            Err(e) => {
                error!(backend = %self.connector.kind(), error = %e, "Cannot connect to the database");
                return false;
            }
        };

        let store: Arc<dyn DocumentStore> = if debug_logging {
            Arc::new(TracingStore::new(store))
        } else {
            store
        };

        let redundant = {
            let mut slot = self.store.write();
            if slot.is_some() {
                Some(store)
            } else {
                *slot = Some(store);
                None
            }
        };
        if let Some(redundant) = redundant {
            // Another caller connected while this one was opening.
            if let Err(e) = redundant.close(false).await {
                warn!(error = %e, "Failed to close redundant connection");
            }
            return true;
        }

        info!(
            backend = %self.connector.kind(),
            tls = use_tls,
            debug = debug_logging,
            "Connected to the database"
        );
        true
    }

    /// Closes the connection if open and resets the state to disconnected.
    ///
    /// The state is reset even when closing the handle fails; the failure is
    /// returned so callers can log it.
    pub async fn close(&self, force: bool) -> Result<(), BackendError> {
        let store = self.store.write().take();
        let Some(store) = store else {
            return Ok(());
        };
        let result = store.close(force).await;
        match &result {
            Ok(()) => info!(force, "Database connection closed"),
            Err(e) => error!(force, error = %e, "Database connection closed with an error"),
        }
        result
    }

    fn connect_options(&self, use_tls: bool, debug_logging: bool) -> Result<ConnectOptions, String> {
        let options = ConnectOptions::new().with_debug(debug_logging);
        if !use_tls {
            return Ok(options);
        }
        match (&self.ssl_cert, &self.ssl_ca) {
            (Some(cert), Some(ca)) => Ok(options.with_tls(cert.clone(), ca.clone())),
            _ => Err("TLS requested without certificate and CA files".to_string()),
        }
    }
}
