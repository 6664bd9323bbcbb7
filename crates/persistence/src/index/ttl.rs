//! Time-to-live index reconciliation.

use tracing::{info, warn};

use crate::core::{DocumentStore, IndexSpec};
use crate::error::StorageResult;
use crate::schema::{EXPIRE_AT_FIELD, Entity};

/// What the TTL reconciler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlOutcome {
    /// No index with the name and a different expiry exists.
    InSync,
    /// The drifted index was dropped and rebuilt with the configured expiry.
    Recreated,
}

/// Rebuilds the TTL index `index_name` of `entity` when its live expiry differs
/// from `expiry_seconds`.
///
/// The drifted index is dropped; a drop failure is logged and recreation runs
/// regardless. The new index goes on the field the live index covered (or
/// `expireAt`), after which every declared index of the entity is rebuilt.
/// Creation errors are returned.
pub async fn ensure_ttl(
    store: &dyn DocumentStore,
    entity: Entity,
    index_name: &str,
    expiry_seconds: u64,
    declared: &[IndexSpec],
) -> StorageResult<TtlOutcome> {
    let collection = entity.collection_name();
    let indexes = store.list_indexes(collection).await?;

    let Some(drifted) = indexes.into_iter().find(|i| {
        i.name == index_name && i.options.expire_after_seconds != Some(expiry_seconds)
    }) else {
        info!(collection, index = index_name, expiry_seconds, "TTL index is in sync");
        return Ok(TtlOutcome::InSync);
    };

    info!(
        collection,
        index = index_name,
        live = ?drifted.options.expire_after_seconds,
        configured = expiry_seconds,
        "TTL index expiry changed, rebuilding"
    );

    let drop_result = store.drop_index(collection, index_name).await;
    if let Err(e) = &drop_result {
        warn!(collection, index = index_name, error = %e, "Failed to drop TTL index");
    }

    let field = drifted.field().unwrap_or(EXPIRE_AT_FIELD);
    let rebuilt = IndexSpec::ttl(field, expiry_seconds).named(index_name);
    store.create_index(collection, &rebuilt).await?;
    store.create_indexes(collection, declared).await?;

    info!(collection, index = index_name, expiry_seconds, "TTL index rebuilt");
    Ok(TtlOutcome::Recreated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryStore;
    use crate::schema::{ExpirySettings, ttl_index_name};

    fn expiry(seconds: u64) -> ExpirySettings {
        ExpirySettings {
            booking: seconds,
            user: seconds,
            token: seconds,
        }
    }

    #[tokio::test]
    async fn test_absent_index_is_in_sync() {
        let store = MemoryStore::new();
        store.create_collection("Token").await.unwrap();

        let outcome = ensure_ttl(&store, Entity::Token, "expireAt_1", 60, &[])
            .await
            .unwrap();
        assert_eq!(outcome, TtlOutcome::InSync);
        assert!(store.index("Token", "expireAt_1").is_none());
    }

    #[tokio::test]
    async fn test_matching_index_is_left_alone() {
        let store = MemoryStore::new();
        store.create_collection("User").await.unwrap();
        let declared = Entity::User.declared_indexes(&expiry(300));
        store.create_indexes("User", &declared).await.unwrap();
        let before = store.operation_counts();

        let outcome = ensure_ttl(&store, Entity::User, &ttl_index_name(), 300, &declared)
            .await
            .unwrap();
        assert_eq!(outcome, TtlOutcome::InSync);
        assert_eq!(store.operation_counts(), before);
    }

    #[tokio::test]
    async fn test_missing_collection_is_an_error() {
        let store = MemoryStore::new();
        let result = ensure_ttl(&store, Entity::Booking, "expireAt_1", 60, &[]).await;
        assert!(result.is_err());
    }
}
