//! Connection manager integration tests.

mod common;

use std::sync::Arc;

use futures::future::join_all;

use common::*;
use movinin_persistence::backends::memory::MemoryConnector;
use movinin_persistence::{ConnectionManager, ConnectionState, DatabaseConfig};

// ============================================================================
// Connect Tests
// ============================================================================

#[tokio::test]
async fn test_connect_opens_connection() {
    let connector = MemoryConnector::default();
    let manager = ConnectionManager::new(Arc::new(connector.clone()));

    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.connect(MEMORY_URI, false, false).await);
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(connector.connections_opened(), 1);
}

#[tokio::test]
async fn test_connect_twice_opens_one_connection() {
    let connector = MemoryConnector::default();
    let manager = ConnectionManager::new(Arc::new(connector.clone()));

    assert!(manager.connect(MEMORY_URI, false, false).await);
    assert!(manager.connect(MEMORY_URI, false, false).await);
    assert_eq!(connector.connections_opened(), 1);
}

#[tokio::test]
async fn test_concurrent_connects_leave_one_handle() {
    let connector = MemoryConnector::default();
    let manager = ConnectionManager::new(Arc::new(connector.clone()));

    let results = join_all((0..4).map(|_| manager.connect(MEMORY_URI, false, false))).await;
    assert!(results.into_iter().all(|connected| connected));
    assert!(manager.is_connected());
    assert!(!connector.store().is_closed());
}

#[tokio::test]
async fn test_unreachable_server_stays_disconnected() {
    let manager = ConnectionManager::new(Arc::new(MemoryConnector::unreachable()));

    assert!(!manager.connect("memory://down", false, false).await);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.store().is_err());
}

#[tokio::test]
async fn test_tls_uses_configured_files() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("client.pem");
    let ca = dir.path().join("ca.pem");
    std::fs::write(&cert, "cert").unwrap();
    std::fs::write(&ca, "ca").unwrap();

    let mut config = DatabaseConfig::new(MEMORY_URI);
    config.ssl = true;
    config.ssl_cert = Some(cert);
    config.ssl_ca = Some(ca);
    assert!(config.validate().is_ok());

    let manager = ConnectionManager::from_config(Arc::new(MemoryConnector::default()), &config);
    assert!(manager.connect(&config.uri, config.ssl, config.debug).await);
}

// ============================================================================
// Close Tests
// ============================================================================

#[tokio::test]
async fn test_close_resets_state() {
    let connector = MemoryConnector::default();
    let manager = ConnectionManager::new(Arc::new(connector.clone()));
    assert!(manager.connect(MEMORY_URI, false, false).await);

    manager.close(false).await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(connector.store().is_closed());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let manager = ConnectionManager::new(Arc::new(MemoryConnector::default()));
    assert!(manager.connect(MEMORY_URI, false, false).await);

    manager.close(true).await.unwrap();
    manager.close(true).await.unwrap();
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_reconnect_after_close() {
    let connector = MemoryConnector::default();
    let manager = ConnectionManager::new(Arc::new(connector.clone()));

    assert!(manager.connect(MEMORY_URI, false, false).await);
    let store = manager.store().unwrap();
    seed_value(store.as_ref(), "en", "Madrid").await;
    manager.close(false).await.unwrap();

    assert!(manager.connect(MEMORY_URI, false, false).await);
    assert_eq!(connector.connections_opened(), 2);
    assert_eq!(connector.store().documents("LocationValue").len(), 1);
}
