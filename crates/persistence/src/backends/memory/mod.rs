//! In-memory backend implementation.
//!
//! This module provides a [`DocumentStore`](crate::core::DocumentStore) held
//! entirely in process memory. It emulates the document-store behaviors the
//! bootstrap engine depends on and is used as the test double for every
//! integration test.
//!
//! # Features
//!
//! - Namespace-exists errors on duplicate collection creation
//! - Index option conflicts and identical-index no-ops
//! - Optional rejection of the `language_override` text index option
//! - Operation counters for idempotence checks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use movinin_persistence::backends::memory::{MemoryConnector, MemoryStore};
//! use movinin_persistence::core::{ConnectOptions, Connector};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let connector = MemoryConnector::new(store.clone());
//!
//! let handle = connector.connect("memory://movinin", &ConnectOptions::new()).await.unwrap();
//! handle.create_collection("User").await.unwrap();
//!
//! assert_eq!(store.collection_names(), vec!["User"]);
//! assert_eq!(connector.connections_opened(), 1);
//! # });
//! ```

mod store;

pub use store::{
    ID_INDEX_NAME, MemoryConnector, MemoryStore, MemoryStoreConfig, OperationCounts,
};
