//! Core store traits and abstractions.
//!
//! This module provides the foundational types of the persistence layer:
//!
//! - [`DocumentStore`] - Document database driver contract
//! - [`Connector`] - Opens a [`DocumentStore`] for one backend
//! - [`Filter`] - The query filters every backend supports
//! - [`IndexSpec`] - Declared and live index descriptors
//! - [`TracingStore`] - Debug-level operation tracing around any store
//!
//! # Example: Querying a Store
//!
//! ```
//! use movinin_persistence::backends::memory::MemoryStore;
//! use movinin_persistence::core::{DocumentStore, Filter};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let doc = json!({"language": "en", "value": "Paris"});
//! store.insert("LocationValue", doc.as_object().unwrap().clone()).await.unwrap();
//!
//! let english = store
//!     .find("LocationValue", &Filter::eq("language", "en"))
//!     .await
//!     .unwrap();
//! assert_eq!(english.len(), 1);
//! # });
//! ```

mod document;
mod index;
mod logging;
mod store;

pub use document::{Document, DocumentId, Filter, ID_FIELD, document_id};
pub use index::{
    IndexKey, IndexKind, IndexOptions, IndexSpec, LANGUAGE_OVERRIDE_SENTINEL,
    TEXT_DEFAULT_LANGUAGE,
};
pub use logging::TracingStore;
pub use store::{BackendKind, ConnectOptions, Connector, DocumentStore, TlsOptions};
