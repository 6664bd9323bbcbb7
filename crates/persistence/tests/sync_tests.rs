//! Multilingual synchronization integration tests.

mod common;

use common::*;
use movinin_persistence::Entity;
use movinin_persistence::backends::memory::MemoryStore;
use movinin_persistence::core::DocumentStore;
use movinin_persistence::sync::{reclaim_orphan_values, sync_languages};

// ============================================================================
// Backfill Tests
// ============================================================================

#[tokio::test]
async fn test_backfill_copies_english_text() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Paris").await;
    let location = seed_record(&store, "Location", &[&en]).await;

    let report = sync_languages(&store, Entity::Location, &languages(&["en", "fr"]))
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(
        resolved_languages(&store, "Location", &location).await,
        vec![
            ("en".to_string(), "Paris".to_string()),
            ("fr".to_string(), "Paris".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_backfill_keeps_existing_translations() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Germany").await;
    let fr = seed_value(&store, "fr", "Allemagne").await;
    let country = seed_record(&store, "Country", &[&en, &fr]).await;

    let report = sync_languages(&store, Entity::Country, &languages(&["en", "fr", "es"]))
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(
        resolved_languages(&store, "Country", &country).await,
        vec![
            ("en".to_string(), "Germany".to_string()),
            ("es".to_string(), "Germany".to_string()),
            ("fr".to_string(), "Allemagne".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_record_without_english_is_skipped() {
    let store = MemoryStore::new();
    let fr = seed_value(&store, "fr", "Lyon").await;
    let location = seed_record(&store, "Location", &[&fr]).await;

    let report = sync_languages(&store, Entity::Location, &languages(&["en", "fr", "es"]))
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.created, 0);
    assert_eq!(read_record(&store, "Location", &location).await.values, vec![fr]);
    assert_eq!(store.documents("LocationValue").len(), 1);
}

#[tokio::test]
async fn test_second_pass_creates_nothing() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Rome").await;
    seed_record(&store, "Location", &[&en]).await;
    let configured = languages(&["en", "fr", "es"]);

    sync_languages(&store, Entity::Location, &configured).await.unwrap();
    let before = store.operation_counts();
    let report = sync_languages(&store, Entity::Location, &configured).await.unwrap();

    assert_eq!(report.created, 0);
    assert_eq!(report.deleted, 0);
    assert_eq!(store.operation_counts(), before);
}

// ============================================================================
// Purge Tests
// ============================================================================

#[tokio::test]
async fn test_purge_removes_dropped_language() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Vienna").await;
    let de = seed_value(&store, "de", "Wien").await;
    let location = seed_record(&store, "Location", &[&en, &de]).await;

    let report = sync_languages(&store, Entity::Location, &languages(&["en"]))
        .await
        .unwrap();

    assert_eq!(report.references_removed, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(read_record(&store, "Location", &location).await.values, vec![en]);
    assert!(store.find_by_id("LocationValue", &de).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_country_value_outside_configured_set() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Switzerland").await;
    let fr = seed_value(&store, "fr", "Suisse").await;
    let de = seed_value(&store, "de", "Schweiz").await;
    let country = seed_record(&store, "Country", &[&en, &fr, &de]).await;

    sync_languages(&store, Entity::Country, &languages(&["en", "fr"]))
        .await
        .unwrap();

    assert_eq!(
        resolved_languages(&store, "Country", &country).await,
        vec![
            ("en".to_string(), "Switzerland".to_string()),
            ("fr".to_string(), "Suisse".to_string()),
        ]
    );
    let remaining: Vec<_> = store
        .documents("LocationValue")
        .into_iter()
        .filter(|d| d.get("language").and_then(|l| l.as_str()) == Some("de"))
        .collect();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_concurrent_passes_share_values_safely() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Belgium").await;
    let de = seed_value(&store, "de", "Belgien").await;
    let location = seed_record(&store, "Location", &[&en, &de]).await;
    let country = seed_record(&store, "Country", &[&en, &de]).await;
    let configured = languages(&["en"]);

    let (location_report, country_report) = tokio::join!(
        sync_languages(&store, Entity::Location, &configured),
        sync_languages(&store, Entity::Country, &configured),
    );
    location_report.unwrap();
    country_report.unwrap();

    assert_eq!(read_record(&store, "Location", &location).await.values, vec![en.clone()]);
    assert_eq!(read_record(&store, "Country", &country).await.values, vec![en]);
    assert!(store.find_by_id("LocationValue", &de).await.unwrap().is_none());
}

// ============================================================================
// Orphan Reclamation Tests
// ============================================================================

#[tokio::test]
async fn test_orphans_reclaimed_after_sync() {
    let store = MemoryStore::new();
    let en = seed_value(&store, "en", "Oslo").await;
    seed_record(&store, "Location", &[&en]).await;
    let orphan = seed_value(&store, "fr", "Oslo").await;

    sync_languages(&store, Entity::Location, &languages(&["en", "fr"]))
        .await
        .unwrap();
    let reclaimed = reclaim_orphan_values(&store).await.unwrap();

    assert_eq!(reclaimed, 1);
    assert!(store.find_by_id("LocationValue", &orphan).await.unwrap().is_none());
    assert_eq!(store.documents("LocationValue").len(), 2);
}
