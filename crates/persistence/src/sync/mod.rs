//! Multilingual data synchronization.
//!
//! Locations and countries reference one [`LocationValue`](crate::schema::LocationValue)
//! per supported language. After a language is added, [`sync_languages`]
//! backfills it from the English value; after one is removed, it purges the
//! obsolete values. [`reclaim_orphan_values`] then deletes values that no
//! record references, such as those left by an interrupted backfill.
//!
//! # Example
//!
//! ```
//! use movinin_persistence::backends::memory::MemoryStore;
//! use movinin_persistence::core::DocumentStore;
//! use movinin_persistence::schema::{Entity, LocationValue};
//! use movinin_persistence::sync::sync_languages;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let en = store
//!     .insert("LocationValue", LocationValue::new_document("en", "Paris"))
//!     .await
//!     .unwrap();
//! let location = json!({"values": [en.to_value()]});
//! store.insert("Location", location.as_object().unwrap().clone()).await.unwrap();
//!
//! let languages = vec!["en".to_string(), "fr".to_string()];
//! let report = sync_languages(&store, Entity::Location, &languages).await.unwrap();
//! assert_eq!(report.created, 1);
//! # });
//! ```

mod languages;
mod orphans;

pub use languages::{SyncReport, sync_languages};
pub use orphans::reclaim_orphan_values;
