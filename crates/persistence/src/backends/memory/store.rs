//! In-memory document store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::core::{
    BackendKind, ConnectOptions, Connector, Document, DocumentId, DocumentStore, Filter, ID_FIELD,
    IndexKey, IndexKind, IndexSpec,
};
use crate::error::BackendError;

const BACKEND_NAME: &str = "memory";

/// Name of the index every collection carries on its identifier.
pub const ID_INDEX_NAME: &str = "_id_";

/// Behavior switches of the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Reject text indexes carrying a `language_override` option, like store
    /// versions without per-document language support.
    pub reject_language_override: bool,
}

impl MemoryStoreConfig {
    /// Rejects `language_override` on text indexes.
    pub fn rejecting_language_override() -> Self {
        Self {
            reject_language_override: true,
        }
    }
}

/// Counts of mutating operations that changed store state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    /// Collections created.
    pub collections_created: u64,
    /// Indexes built (identical re-creations are not counted).
    pub indexes_created: u64,
    /// Indexes dropped.
    pub indexes_dropped: u64,
    /// Documents inserted.
    pub documents_inserted: u64,
    /// Documents replaced.
    pub documents_saved: u64,
    /// Documents deleted.
    pub documents_deleted: u64,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<(DocumentId, Document)>,
    indexes: Vec<IndexSpec>,
}

impl MemoryCollection {
    fn new() -> Self {
        Self {
            documents: Vec::new(),
            indexes: vec![IndexSpec {
                name: ID_INDEX_NAME.to_string(),
                keys: vec![(ID_FIELD.to_string(), IndexKey::Ascending)],
                options: Default::default(),
            }],
        }
    }
}

/// A document store held in process memory.
///
/// Emulates the MongoDB behaviors the bootstrap engine relies on: creating an
/// existing collection fails with a namespace error, re-creating an identical
/// index is a no-op, re-using an index name with other options conflicts, a
/// collection holds at most one text index, and inserting or indexing into a
/// missing collection creates it.
#[derive(Debug)]
pub struct MemoryStore {
    config: MemoryStoreConfig,
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
    counts: Mutex<OperationCounts>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Creates an empty store with the given behavior.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            collections: RwLock::new(BTreeMap::new()),
            counts: Mutex::new(OperationCounts::default()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether `close` has been called since the store was last opened.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Marks the store open again.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    /// Returns the state-changing operation counts so far.
    pub fn operation_counts(&self) -> OperationCounts {
        *self.counts.lock()
    }

    /// Returns collection names without going through the store contract.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Returns the live index with the given name.
    pub fn index(&self, collection: &str, name: &str) -> Option<IndexSpec> {
        self.collections
            .read()
            .get(collection)
            .and_then(|c| c.indexes.iter().find(|i| i.name == name).cloned())
    }

    /// Returns every document of a collection.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.iter().map(|(_, d)| d.clone()).collect())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.is_closed() {
            Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: "store is closed".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn allocate_id(&self) -> DocumentId {
        DocumentId::from_counter(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_index(
        &self,
        collection: &str,
        existing: &[IndexSpec],
        index: &IndexSpec,
    ) -> Result<bool, BackendError> {
        if self.config.reject_language_override
            && index.kind() == IndexKind::Text
            && index.options.language_override.is_some()
        {
            return Err(BackendError::UnsupportedIndexOption {
                collection: collection.to_string(),
                index: index.name.clone(),
                option: "language_override".to_string(),
            });
        }

        if let Some(same_name) = existing.iter().find(|i| i.name == index.name) {
            if same_name == index {
                return Ok(false);
            }
            return Err(BackendError::IndexOptionsConflict {
                collection: collection.to_string(),
                index: index.name.clone(),
                message: "an index with this name exists with different keys or options"
                    .to_string(),
            });
        }

        if let Some(same_keys) = existing.iter().find(|i| i.keys == index.keys) {
            return Err(BackendError::IndexOptionsConflict {
                collection: collection.to_string(),
                index: index.name.clone(),
                message: format!("index {} already covers these keys", same_keys.name),
            });
        }

        if index.kind() == IndexKind::Text {
            if let Some(text) = existing.iter().find(|i| i.kind() == IndexKind::Text) {
                return Err(BackendError::IndexOptionsConflict {
                    collection: collection.to_string(),
                    index: index.name.clone(),
                    message: format!("collection already has text index {}", text.name),
                });
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        self.ensure_open()?;
        Ok(self.collection_names())
    }

    async fn create_collection(&self, name: &str) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(BackendError::NamespaceExists {
                collection: name.to_string(),
            });
        }
        collections.insert(name.to_string(), MemoryCollection::new());
        self.counts.lock().collections_created += 1;
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, BackendError> {
        self.ensure_open()?;
        self.collections
            .read()
            .get(collection)
            .map(|c| c.indexes.clone())
            .ok_or_else(|| BackendError::NamespaceNotFound {
                collection: collection.to_string(),
            })
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let created_collection = !collections.contains_key(collection);
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(MemoryCollection::new);

        let result = self.check_index(collection, &entry.indexes, index);
        let mut counts = self.counts.lock();
        if created_collection {
            counts.collections_created += 1;
        }
        if result? {
            entry.indexes.push(index.clone());
            counts.indexes_created += 1;
        }
        Ok(())
    }

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

    async fn drop_index(&self, collection: &str, name: &str) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let entry =
            collections
                .get_mut(collection)
                .ok_or_else(|| BackendError::NamespaceNotFound {
                    collection: collection.to_string(),
                })?;
        let position = entry
            .indexes
            .iter()
            .position(|i| i.name == name && i.name != ID_INDEX_NAME)
            .ok_or_else(|| BackendError::IndexNotFound {
                collection: collection.to_string(),
                index: name.to_string(),
            })?;
        entry.indexes.remove(position);
        self.counts.lock().indexes_dropped += 1;
        Ok(())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, BackendError> {
        self.ensure_open()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|(_, d)| filter.matches(d))
                    .map(|(_, d)| d.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<DocumentId, BackendError> {
        self.ensure_open()?;
        let id = match document.get(ID_FIELD) {
            Some(value) => DocumentId::from_value(value).map_err(|e| {
                BackendError::SerializationError {
                    message: e.to_string(),
                }
            })?,
            None => self.allocate_id(),
        };
        document.insert(ID_FIELD.to_string(), id.to_value());

        let mut collections = self.collections.write();
        let created_collection = !collections.contains_key(collection);
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(MemoryCollection::new);
        if entry.documents.iter().any(|(existing, _)| *existing == id) {
            return Err(BackendError::QueryError {
                message: format!("duplicate key {} in {}", id, collection),
            });
        }
        entry.documents.push((id.clone(), document));

        let mut counts = self.counts.lock();
        if created_collection {
            counts.collections_created += 1;
        }
        counts.documents_inserted += 1;
        Ok(id)
    }

    async fn save(
        &self,
        collection: &str,
        id: &DocumentId,
        mut document: Document,
    ) -> Result<(), BackendError> {
        self.ensure_open()?;
        document.insert(ID_FIELD.to_string(), id.to_value());

        let mut collections = self.collections.write();
        let slot = collections
            .get_mut(collection)
            .and_then(|c| c.documents.iter_mut().find(|(existing, _)| existing == id))
            .ok_or_else(|| BackendError::QueryError {
                message: format!("no document {} in {}", id, collection),
            })?;
        slot.1 = document;
        self.counts.lock().documents_saved += 1;
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, BackendError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entry.documents.len();
        entry.documents.retain(|(_, d)| !filter.matches(d));
        let deleted = (before - entry.documents.len()) as u64;
        self.counts.lock().documents_deleted += deleted;
        Ok(deleted)
    }

    async fn close(&self, _force: bool) -> Result<(), BackendError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Opens a shared [`MemoryStore`].
///
/// Every successful `connect` hands out the same store, reopened, so data
/// survives a close and reconnect like a real server's would.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    reachable: bool,
    connections: Arc<AtomicUsize>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl MemoryConnector {
    /// Connector handing out `store`.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            reachable: true,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Connector whose every connection attempt fails.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    /// Returns the shared store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Number of successful connections opened.
    pub fn connections_opened(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn connect(
        &self,
        uri: &str,
        _options: &ConnectOptions,
    ) -> Result<Arc<dyn DocumentStore>, BackendError> {
        if !self.reachable {
            return Err(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("server at {} is unreachable", uri),
            });
        }
        self.store.reopen();
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.clone())
    }
}
