//! Reclamation of location values no record references.

use std::collections::HashSet;

use tracing::info;

use crate::core::{DocumentId, DocumentStore, Filter, ID_FIELD, document_id};
use crate::error::StorageResult;
use crate::schema::{Entity, MultilingualRecord, from_document};

/// Deletes every location value no location or country references and
/// returns the number deleted.
///
/// Must not run concurrently with a language backfill, which inserts a value
/// before appending its reference.
pub async fn reclaim_orphan_values(store: &dyn DocumentStore) -> StorageResult<u64> {
    let mut referenced: HashSet<DocumentId> = HashSet::new();
    for owner in Entity::MULTILINGUAL {
        let collection = owner.collection_name();
        for document in store.find(collection, &Filter::All).await? {
            let record: MultilingualRecord = from_document(collection, document)?;
            referenced.extend(record.values);
        }
    }

    let value_collection = Entity::LocationValue.collection_name();
    let mut orphans = Vec::new();
    for document in store.find(value_collection, &Filter::All).await? {
        let id = document_id(value_collection, &document)?;
        if !referenced.contains(&id) {
            orphans.push(id);
        }
    }

    if orphans.is_empty() {
        info!(collection = value_collection, "No orphan values");
        return Ok(0);
    }

    let deleted = store
        .delete_many(
            value_collection,
            &Filter::is_in(ID_FIELD, orphans.iter().map(DocumentId::to_value)),
        )
        .await?;
    info!(collection = value_collection, deleted, "Orphan values reclaimed");
    Ok(deleted)
}
