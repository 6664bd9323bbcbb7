//! Document store abstraction.
//!
//! This module defines the [`DocumentStore`] trait, the narrow driver contract
//! the bootstrap engine needs from a document database, and the [`Connector`]
//! trait that opens one. Each backend implements both.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::document::{Document, DocumentId, Filter};
use crate::core::index::IndexSpec;
use crate::error::BackendError;

/// Identifies the type of document store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// In-process store.
    Memory,
    /// MongoDB (document store).
    MongoDB,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::MongoDB => write!(f, "mongodb"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// TLS material for a store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// Client certificate and private key (PEM).
    pub cert_key_file: PathBuf,
    /// Certificate authority bundle (PEM).
    pub ca_file: PathBuf,
}

/// Options used when opening a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// TLS material, or `None` for a plain connection.
    pub tls: Option<TlsOptions>,
    /// Trace every store operation at `debug` level.
    pub debug: bool,
}

impl ConnectOptions {
    /// Plain connection without TLS.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TLS material.
    pub fn with_tls(mut self, cert_key_file: impl Into<PathBuf>, ca_file: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsOptions {
            cert_key_file: cert_key_file.into(),
            ca_file: ca_file.into(),
        });
        self
    }

    /// Enables operation tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// An open handle to a document database.
///
/// Implementations must be thread-safe; the engine shares one handle across
/// the concurrent stages of an initialization run.
///
/// # Store semantics
///
/// - `create_collection` fails with [`BackendError::NamespaceExists`] when the
///   collection exists.
/// - `create_index` is a no-op when an identical index exists and fails with
///   [`BackendError::IndexOptionsConflict`] when the name is taken with other
///   keys or options.
/// - `find` on a missing collection returns no documents.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this store.
    fn name(&self) -> &'static str;

    /// Lists collection names.
    async fn list_collections(&self) -> Result<Vec<String>, BackendError>;

    /// Creates an empty collection.
    async fn create_collection(&self, name: &str) -> Result<(), BackendError>;

    /// Lists the live indexes of a collection.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, BackendError>;

    /// Creates one index.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), BackendError>;

    /// Creates several indexes.
    async fn create_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> Result<(), BackendError> {
        for index in indexes {
            self.create_index(collection, index).await?;
        }
        Ok(())
    }

    /// Drops an index by name.
    async fn drop_index(&self, collection: &str, name: &str) -> Result<(), BackendError>;

    /// Finds documents matching a filter.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, BackendError>;

    /// Finds one document by identifier.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, BackendError> {
        let documents = self.find(collection, &Filter::id(id)).await?;
        Ok(documents.into_iter().next())
    }

    /// Inserts a document, assigning an identifier when it has none.
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, BackendError>;

    /// Replaces the document with the given identifier.
    async fn save(
        &self,
        collection: &str,
        id: &DocumentId,
        document: Document,
    ) -> Result<(), BackendError>;

    /// Deletes every document matching a filter, returning the count.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, BackendError>;

    /// Closes the handle. `force` abandons in-flight operations.
    async fn close(&self, force: bool) -> Result<(), BackendError>;
}

/// Opens document stores for one backend.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Returns the kind of backend this connector opens.
    fn kind(&self) -> BackendKind;

    /// Opens a store and waits until it reports the connection fully open.
    async fn connect(
        &self,
        uri: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn DocumentStore>, BackendError>;
}
