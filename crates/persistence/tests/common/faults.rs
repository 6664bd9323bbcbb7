//! Fault injection around the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use movinin_persistence::backends::memory::MemoryStore;
use movinin_persistence::core::{
    BackendKind, ConnectOptions, Connector, Document, DocumentId, DocumentStore, Filter, IndexSpec,
};
use movinin_persistence::error::BackendError;

fn injected(message: &str) -> BackendError {
    BackendError::Unavailable {
        backend_name: "flaky".to_string(),
        message: message.to_string(),
    }
}

/// Wraps a [`MemoryStore`], failing selected operations.
#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    create_collection_failures: AtomicU32,
    create_collection_calls: AtomicUsize,
    create_index_failures: AtomicU32,
    failing_finds: Mutex<Vec<String>>,
    failing_drops: Mutex<Vec<String>>,
}

impl FlakyStore {
    /// Wraps `inner` without any fault.
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            create_collection_failures: AtomicU32::new(0),
            create_collection_calls: AtomicUsize::new(0),
            create_index_failures: AtomicU32::new(0),
            failing_finds: Mutex::new(Vec::new()),
            failing_drops: Mutex::new(Vec::new()),
        }
    }

    /// Fails the next `count` collection creations.
    pub fn fail_create_collection(self, count: u32) -> Self {
        self.create_collection_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fails the next `count` index builds.
    pub fn fail_create_index(self, count: u32) -> Self {
        self.create_index_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fails every query on `collection`.
    pub fn fail_finds_on(self, collection: &str) -> Self {
        self.failing_finds.lock().push(collection.to_string());
        self
    }

    /// Fails every index drop on `collection`.
    pub fn fail_drops_on(self, collection: &str) -> Self {
        self.failing_drops.lock().push(collection.to_string());
        self
    }

    /// Number of collection creations attempted.
    pub fn create_collection_calls(&self) -> usize {
        self.create_collection_calls.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &Arc<MemoryStore> {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("flaky")
    }

    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        self.inner.list_collections().await
    }

    async fn create_collection(&self, name: &str) -> Result<(), BackendError> {
        self.create_collection_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.create_collection_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.create_collection_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(injected("injected create_collection failure"));
        }
        self.inner.create_collection(name).await
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, BackendError> {
        self.inner.list_indexes(collection).await
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), BackendError> {
        let remaining = self.create_index_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.create_index_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(injected("injected create_index failure"));
        }
        self.inner.create_index(collection, index).await
    }

    async fn drop_index(&self, collection: &str, name: &str) -> Result<(), BackendError> {
        if self.failing_drops.lock().iter().any(|c| c == collection) {
            return Err(injected("injected drop_index failure"));
        }
        self.inner.drop_index(collection, name).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, BackendError> {
        if self.failing_finds.lock().iter().any(|c| c == collection) {
            return Err(injected("injected find failure"));
        }
        self.inner.find(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, BackendError> {
        self.inner.insert(collection, document).await
    }

    async fn save(
        &self,
        collection: &str,
        id: &DocumentId,
        document: Document,
    ) -> Result<(), BackendError> {
        self.inner.save(collection, id, document).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, BackendError> {
        self.inner.delete_many(collection, filter).await
    }

    async fn close(&self, force: bool) -> Result<(), BackendError> {
        self.inner.close(force).await
    }
}

/// Hands out one shared [`FlakyStore`].
#[derive(Debug, Clone)]
pub struct FlakyConnector {
    store: Arc<FlakyStore>,
}

impl FlakyConnector {
    /// Connector for `store`.
    pub fn new(store: FlakyStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<FlakyStore> {
        &self.store
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("flaky")
    }

    async fn connect(
        &self,
        _uri: &str,
        _options: &ConnectOptions,
    ) -> Result<Arc<dyn DocumentStore>, BackendError> {
        self.store.inner().reopen();
        Ok(self.store.clone())
    }
}
