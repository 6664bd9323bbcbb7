//! Configuration fixtures and seed helpers.

use std::time::Duration;

use serde_json::{Value, json};

use movinin_persistence::DatabaseConfig;
use movinin_persistence::backends::memory::MemoryStore;
use movinin_persistence::core::{Document, DocumentId, DocumentStore};
use movinin_persistence::schema::{LocationValue, MultilingualRecord, from_document};

/// URI understood by the memory connector.
pub const MEMORY_URI: &str = "memory://movinin";

/// A configuration for the memory backend with millisecond retry delays.
pub fn test_config(languages: &[&str]) -> DatabaseConfig {
    DatabaseConfig::new(MEMORY_URI)
        .with_languages(languages.iter().copied())
        .with_provisioning(3, Duration::from_millis(10))
}

/// Owned language list.
pub fn languages(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

/// Inserts a location value.
pub async fn seed_value(store: &dyn DocumentStore, language: &str, value: &str) -> DocumentId {
    store
        .insert("LocationValue", LocationValue::new_document(language, value))
        .await
        .expect("Failed to seed location value")
}

/// Inserts a multilingual record referencing `values`.
pub async fn seed_record(
    store: &dyn DocumentStore,
    collection: &str,
    values: &[&DocumentId],
) -> DocumentId {
    let references: Vec<Value> = values.iter().map(|id| id.to_value()).collect();
    let document: Document = json!({ "values": references })
        .as_object()
        .cloned()
        .expect("object literal");
    store
        .insert(collection, document)
        .await
        .expect("Failed to seed record")
}

/// Reads back a multilingual record.
pub async fn read_record(
    store: &dyn DocumentStore,
    collection: &str,
    id: &DocumentId,
) -> MultilingualRecord {
    let document = store
        .find_by_id(collection, id)
        .await
        .expect("Failed to read record")
        .expect("record exists");
    from_document(collection, document).expect("valid record")
}

/// Resolves a record's values to `(language, value)` pairs, sorted.
pub async fn resolved_languages(
    store: &MemoryStore,
    collection: &str,
    id: &DocumentId,
) -> Vec<(String, String)> {
    let record = read_record(store, collection, id).await;
    let mut pairs = Vec::new();
    for value_id in &record.values {
        let document = store
            .find_by_id("LocationValue", value_id)
            .await
            .expect("Failed to read value")
            .expect("referenced value exists");
        let value: LocationValue = from_document("LocationValue", document).expect("valid value");
        pairs.push((value.language, value.value));
    }
    pairs.sort();
    pairs
}
