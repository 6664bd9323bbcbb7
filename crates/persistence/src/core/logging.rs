//! Operation tracing decorator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::document::{Document, DocumentId, Filter};
use crate::core::index::IndexSpec;
use crate::core::store::{BackendKind, DocumentStore};
use crate::error::BackendError;

/// Wraps a store and traces every operation at `debug` level.
///
/// Installed by the connection manager when debug logging is requested.
#[derive(Debug)]
pub struct TracingStore {
    inner: Arc<dyn DocumentStore>,
}

impl TracingStore {
    /// Wraps a store.
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<dyn DocumentStore> {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for TracingStore {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        let result = self.inner.list_collections().await;
        debug!(backend = self.name(), ok = result.is_ok(), "listCollections");
        result
    }

    async fn create_collection(&self, name: &str) -> Result<(), BackendError> {
        let result = self.inner.create_collection(name).await;
        debug!(collection = name, ok = result.is_ok(), "createCollection");
        result
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, BackendError> {
        let result = self.inner.list_indexes(collection).await;
        debug!(collection, ok = result.is_ok(), "listIndexes");
        result
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), BackendError> {
        let result = self.inner.create_index(collection, index).await;
        debug!(collection, index = %index.name, kind = %index.kind(), ok = result.is_ok(), "createIndex");
        result
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> Result<(), BackendError> {
        let result = self.inner.create_indexes(collection, indexes).await;
        debug!(collection, count = indexes.len(), ok = result.is_ok(), "createIndexes");
        result
    }

    async fn drop_index(&self, collection: &str, name: &str) -> Result<(), BackendError> {
        let result = self.inner.drop_index(collection, name).await;
        debug!(collection, index = name, ok = result.is_ok(), "dropIndex");
        result
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, BackendError> {
        let result = self.inner.find(collection, filter).await;
        match &result {
            Ok(documents) => debug!(collection, ?filter, matched = documents.len(), "find"),
            Err(e) => debug!(collection, ?filter, error = %e, "find"),
        }
        result
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, BackendError> {
        let result = self.inner.find_by_id(collection, id).await;
        debug!(collection, id = %id, ok = result.is_ok(), "findById");
        result
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, BackendError> {
        let result = self.inner.insert(collection, document).await;
        match &result {
            Ok(id) => debug!(collection, id = %id, "insertOne"),
            Err(e) => debug!(collection, error = %e, "insertOne"),
        }
        result
    }

    async fn save(
        &self,
        collection: &str,
        id: &DocumentId,
        document: Document,
    ) -> Result<(), BackendError> {
        let result = self.inner.save(collection, id, document).await;
        debug!(collection, id = %id, ok = result.is_ok(), "replaceOne");
        result
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, BackendError> {
        let result = self.inner.delete_many(collection, filter).await;
        match &result {
            Ok(deleted) => debug!(collection, ?filter, deleted, "deleteMany"),
            Err(e) => debug!(collection, ?filter, error = %e, "deleteMany"),
        }
        result
    }

    async fn close(&self, force: bool) -> Result<(), BackendError> {
        let result = self.inner.close(force).await;
        debug!(backend = self.name(), force, ok = result.is_ok(), "close");
        result
    }
}
