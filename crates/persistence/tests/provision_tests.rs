//! Collection provisioning integration tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use movinin_persistence::Entity;
use movinin_persistence::backends::memory::MemoryStore;
use movinin_persistence::core::DocumentStore;
use movinin_persistence::error::ProvisionError;
use movinin_persistence::provision::{RetryPolicy, ensure_collection, ensure_collections};

fn policy() -> RetryPolicy {
    RetryPolicy {
        retries: 3,
        base_delay: Duration::from_millis(500),
    }
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_transient_failures() {
    let store = FlakyStore::new(Arc::new(MemoryStore::new())).fail_create_collection(2);
    let expiry = test_config(&["en"]).expiry();
    let indexes = Entity::User.declared_indexes(&expiry);

    ensure_collection(&store, Entity::User, &indexes, &policy())
        .await
        .unwrap();

    assert_eq!(store.create_collection_calls(), 3);
    assert_eq!(store.inner().collection_names(), vec!["User"]);
    assert!(store.inner().index("User", "email_1").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_report_attempts() {
    let store = FlakyStore::new(Arc::new(MemoryStore::new())).fail_create_collection(10);
    let expiry = test_config(&["en"]).expiry();
    let indexes = Entity::Booking.declared_indexes(&expiry);

    let err = ensure_collection(&store, Entity::Booking, &indexes, &policy())
        .await
        .unwrap_err();

    match err {
        ProvisionError::RetriesExhausted {
            collection,
            attempts,
            ..
        } => {
            assert_eq!(collection, "Booking");
            assert_eq!(attempts, 3);
        }
    }
    assert_eq!(store.create_collection_calls(), 3);
    assert!(store.inner().collection_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_index_failure_builds_declared_indexes() {
    let store = FlakyStore::new(Arc::new(MemoryStore::new())).fail_create_index(1);
    let expiry = test_config(&["en"]).expiry();
    let indexes = Entity::User.declared_indexes(&expiry);

    ensure_collection(&store, Entity::User, &indexes, &policy())
        .await
        .unwrap();

    assert_eq!(store.create_collection_calls(), 1);
    for index in &indexes {
        let live = store
            .inner()
            .index("User", &index.name)
            .unwrap_or_else(|| panic!("User missing {}", index.name));
        assert_eq!(&live, index);
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let store = FlakyStore::new(Arc::new(MemoryStore::new())).fail_create_collection(2);
    let started = tokio::time::Instant::now();

    ensure_collection(&store, Entity::Token, &[], &policy())
        .await
        .unwrap();

    // 500ms before the second attempt, 1000ms before the third.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1500), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1600), "elapsed {:?}", elapsed);
}

// ============================================================================
// Provisioning Tests
// ============================================================================

#[tokio::test]
async fn test_existing_collection_is_left_alone() {
    let store = MemoryStore::new();
    store.create_collection("Country").await.unwrap();
    let before = store.operation_counts();

    let expiry = test_config(&["en"]).expiry();
    let indexes = Entity::Country.declared_indexes(&expiry);
    ensure_collection(&store, Entity::Country, &indexes, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(store.operation_counts(), before);
    assert!(store.index("Country", "values_1").is_none());
}

#[tokio::test]
async fn test_all_entities_get_declared_indexes() {
    let store = MemoryStore::new();
    let expiry = test_config(&["en"]).expiry();

    ensure_collections(&store, &Entity::ALL, &expiry, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(store.collection_names().len(), Entity::ALL.len());
    for entity in Entity::ALL {
        for index in entity.declared_indexes(&expiry) {
            let live = store
                .index(entity.collection_name(), &index.name)
                .unwrap_or_else(|| panic!("{} missing {}", entity, index.name));
            assert_eq!(live, index);
        }
    }
}

#[tokio::test]
async fn test_ttl_indexes_use_configured_expiry() {
    let store = MemoryStore::new();
    let mut config = test_config(&["en"]);
    config.token_expire_at = 600;

    ensure_collections(&store, &Entity::EXPIRING, &config.expiry(), &RetryPolicy::default())
        .await
        .unwrap();

    let ttl = store.index("Token", "expireAt_1").unwrap();
    assert_eq!(ttl.options.expire_after_seconds, Some(600));
    let ttl = store.index("User", "expireAt_1").unwrap();
    assert_eq!(ttl.options.expire_after_seconds, Some(config.user_expire_at));
}
