//! Full-text index reconciliation.

use tracing::{error, info, warn};

use crate::core::{DocumentStore, IndexSpec};
use crate::schema::Entity;

/// What the text index reconciler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextIndexOutcome {
    /// The live index already had the language-agnostic options.
    Unchanged,
    /// The index was (re)built with the language-agnostic options.
    Created,
    /// The store rejected the language options; a plain text index was built.
    /// A plain index never matches the fallback options, so every run rebuilds it.
    CreatedPlain,
    /// Neither variant could be built. Logged, never fatal.
    Failed,
}

/// Ensures `entity` carries a text index on `field` named `index_name` whose
/// default language is `none` and whose language-override field is a sentinel
/// no document carries.
///
/// A live index with other language options is dropped and recreated. When the
/// store rejects the language options, a plain text index with the same name
/// and weight is built instead. Never fails: errors are logged and reported
/// through the outcome.
pub async fn ensure_text_index(
    store: &dyn DocumentStore,
    entity: Entity,
    field: &str,
    index_name: &str,
) -> TextIndexOutcome {
    let collection = entity.collection_name();

    let indexes = match store.list_indexes(collection).await {
        Ok(indexes) => indexes,
        Err(e) => {
            error!(collection, index = index_name, error = %e, "Failed to list indexes");
            return TextIndexOutcome::Failed;
        }
    };

    if let Some(existing) = indexes.iter().find(|i| i.name == index_name) {
        if existing.has_language_fallback() {
            info!(collection, index = index_name, "Text index is up to date");
            return TextIndexOutcome::Unchanged;
        }

        info!(
            collection,
            index = index_name,
            default_language = ?existing.options.default_language,
            language_override = ?existing.options.language_override,
            "Text index language options differ, rebuilding"
        );
        if let Err(e) = store.drop_index(collection, index_name).await {
            warn!(collection, index = index_name, error = %e, "Failed to drop text index");
        }
    }

    let plain = IndexSpec::text(field, index_name);
    match store
        .create_index(collection, &plain.clone().with_language_fallback())
        .await
    {
        Ok(()) => {
            info!(collection, index = index_name, "Text index created with language fallback");
            TextIndexOutcome::Created
        }
        Err(e) => {
            warn!(
                collection,
                index = index_name,
                error = %e,
                "Text index with language options rejected, creating a plain text index"
            );
            match store.create_index(collection, &plain).await {
                Ok(()) => {
                    // Never matches the fallback options, so the next run rebuilds it.
                    info!(
                        collection,
                        index = index_name,
                        "Plain text index created, rebuilt on each run while the store rejects language options"
                    );
                    TextIndexOutcome::CreatedPlain
                }
                Err(e) => {
                    error!(collection, index = index_name, error = %e, "Failed to create text index");
                    TextIndexOutcome::Failed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryStore, MemoryStoreConfig};

    #[tokio::test]
    async fn test_creates_missing_text_index() {
        let store = MemoryStore::new();
        store.create_collection("Property").await.unwrap();

        let outcome = ensure_text_index(&store, Entity::Property, "name", "name_text").await;
        assert_eq!(outcome, TextIndexOutcome::Created);

        let index = store.index("Property", "name_text").unwrap();
        assert!(index.has_language_fallback());
        assert!(index.options.background);
    }

    #[tokio::test]
    async fn test_second_run_is_unchanged() {
        let store = MemoryStore::new();
        store.create_collection("LocationValue").await.unwrap();

        ensure_text_index(&store, Entity::LocationValue, "value", "value_text").await;
        let before = store.operation_counts();
        let outcome = ensure_text_index(&store, Entity::LocationValue, "value", "value_text").await;

        assert_eq!(outcome, TextIndexOutcome::Unchanged);
        assert_eq!(store.operation_counts(), before);
    }

    #[tokio::test]
    async fn test_missing_collection_fails_quietly() {
        let store = MemoryStore::with_config(MemoryStoreConfig::default());
        let outcome = ensure_text_index(&store, Entity::Property, "name", "name_text").await;
        assert_eq!(outcome, TextIndexOutcome::Failed);
    }
}
