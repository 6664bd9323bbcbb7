//! Movin' In Persistence Layer
//!
//! This crate provides the database bootstrap and reconciliation engine of the
//! Movin' In rental marketplace. On every process start it connects to the
//! document store and converges collection, index, and multilingual reference
//! data state onto the current configuration. Every step is idempotent.
//!
//! # Features
//!
//! - **Connection lifecycle**: idempotent connect/close with optional TLS and
//!   debug-level operation tracing
//! - **Collection provisioning**: per-entity collections and declared indexes,
//!   retried with exponential backoff
//! - **Index reconciliation**: language-agnostic full-text indexes and TTL
//!   indexes that follow configured expiry durations
//! - **Multilingual synchronization**: per-language backfill and purge of
//!   location and country names, plus orphan reclamation
//!
//! # Backend Features
//!
//! Available backend features:
//! - `mongodb` (default) - MongoDB via the official driver
//!
//! The in-memory backend ([`backends::memory`]) is always available.
//!
//! # Architecture
//!
//! - [`core`] - Store contract, filters, and index descriptors
//! - [`backends`] - Backend implementations (memory, MongoDB)
//! - [`schema`] - Entity catalog and typed records
//! - [`connection`] - Connection manager
//! - [`provision`] - Collection provisioner
//! - [`index`] - Text and TTL index reconcilers
//! - [`sync`] - Multilingual data synchronizer
//! - [`init`] - Initialization orchestrator
//! - [`config`] - Database configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use movinin_persistence::backends::memory::MemoryConnector;
//! use movinin_persistence::{ConnectionManager, DatabaseConfig, Initializer};
//!
//! # tokio_test::block_on(async {
//! let config = DatabaseConfig::new("memory://movinin").with_languages(["en", "fr"]);
//! let connection = ConnectionManager::from_config(Arc::new(MemoryConnector::default()), &config);
//!
//! assert!(connection.connect(&config.uri, config.ssl, config.debug).await);
//! assert!(Initializer::new(&connection, &config).initialize().await);
//!
//! connection.close(false).await.unwrap();
//! assert!(!connection.is_connected());
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod connection;
pub mod core;
pub mod error;
pub mod index;
pub mod init;
pub mod provision;
pub mod schema;
pub mod sync;

// Re-export commonly used types at crate root
pub use config::DatabaseConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{StorageError, StorageResult};
pub use init::Initializer;
pub use schema::Entity;

// Re-export core traits
pub use core::{Connector, DocumentStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
