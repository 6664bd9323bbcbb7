//! Per-language backfill and purge of location values.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::{DocumentStore, DocumentId, Filter};
use crate::error::StorageResult;
use crate::schema::{
    CANONICAL_LANGUAGE, Entity, LANGUAGE_FIELD, LocationValue, MultilingualRecord, VALUES_FIELD,
    from_document, to_document,
};

/// Counters of one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records examined.
    pub scanned: usize,
    /// Records without an English value, left untouched.
    pub skipped: usize,
    /// Values created for missing languages.
    pub created: usize,
    /// References to obsolete values removed from this entity's records.
    pub references_removed: usize,
    /// Obsolete values deleted.
    pub deleted: u64,
}

/// Brings every record of `entity` in line with `languages`.
///
/// Records lacking an English value are skipped with a warning. Missing
/// languages are backfilled with the English text, re-reading the record
/// before each append. Values in languages no longer configured lose their
/// references from this entity's records, and are deleted once no
/// multilingual record of any entity references them.
pub async fn sync_languages(
    store: &dyn DocumentStore,
    entity: Entity,
    languages: &[String],
) -> StorageResult<SyncReport> {
    let mut report = SyncReport::default();
    backfill(store, entity, languages, &mut report).await?;
    purge(store, entity, languages, &mut report).await?;
    Ok(report)
}

async fn load_records(
    store: &dyn DocumentStore,
    entity: Entity,
) -> StorageResult<Vec<MultilingualRecord>> {
    let collection = entity.collection_name();
    let records = store
        .find(collection, &Filter::All)
        .await?
        .into_iter()
        .map(|document| from_document(collection, document))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

async fn load_values(
    store: &dyn DocumentStore,
    filter: &Filter,
) -> StorageResult<Vec<LocationValue>> {
    let collection = Entity::LocationValue.collection_name();
    let values = store
        .find(collection, filter)
        .await?
        .into_iter()
        .map(|document| from_document(collection, document))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

async fn backfill(
    store: &dyn DocumentStore,
    entity: Entity,
    languages: &[String],
    report: &mut SyncReport,
) -> StorageResult<()> {
    let collection = entity.collection_name();
    let records = load_records(store, entity).await?;

    let referenced: HashSet<&DocumentId> = records.iter().flat_map(|r| r.values.iter()).collect();
    let values: HashMap<DocumentId, LocationValue> = if referenced.is_empty() {
        HashMap::new()
    } else {
        load_values(store, &Filter::ids(referenced.iter().copied()))
            .await?
            .into_iter()
            .map(|value| (value.id.clone(), value))
            .collect()
    };

    for record in &records {
        report.scanned += 1;
        let resolved: Vec<&LocationValue> =
            record.values.iter().filter_map(|id| values.get(id)).collect();

        let Some(english) = resolved.iter().find(|v| v.language == CANONICAL_LANGUAGE) else {
            warn!(collection, id = %record.id, "Record has no English value, skipping");
            report.skipped += 1;
            continue;
        };

        let present: HashSet<&str> = resolved.iter().map(|v| v.language.as_str()).collect();
        for language in languages.iter().filter(|l| !present.contains(l.as_str())) {
            let value_collection = Entity::LocationValue.collection_name();
            let value_id = store
                .insert(
                    value_collection,
                    LocationValue::new_document(language, &english.value),
                )
                .await?;

            let Some(current) = store.find_by_id(collection, &record.id).await? else {
                warn!(collection, id = %record.id, language = %language, "Record disappeared during backfill");
                break;
            };
            let mut current: MultilingualRecord = from_document(collection, current)?;
            current.push_value(value_id.clone());
            store
                .save(collection, &record.id, to_document(collection, &current)?)
                .await?;

            debug!(collection, id = %record.id, language = %language, value = %value_id, "Value backfilled");
            report.created += 1;
        }
    }

    Ok(())
}

async fn purge(
    store: &dyn DocumentStore,
    entity: Entity,
    languages: &[String],
    report: &mut SyncReport,
) -> StorageResult<()> {
    let collection = entity.collection_name();
    let configured: Vec<Value> = languages.iter().map(|l| Value::String(l.clone())).collect();
    let obsolete = load_values(store, &Filter::not_in(LANGUAGE_FIELD, configured)).await?;
    if obsolete.is_empty() {
        return Ok(());
    }

    for value in &obsolete {
        let parents = store
            .find(collection, &Filter::references(VALUES_FIELD, &value.id))
            .await?;
        for parent in parents {
            let mut parent: MultilingualRecord = from_document(collection, parent)?;
            let removed = parent.remove_value(&value.id);
            if removed == 0 {
                continue;
            }
            store
                .save(collection, &parent.id, to_document(collection, &parent)?)
                .await?;
            debug!(collection, id = %parent.id, language = %value.language, "Obsolete reference removed");
            report.references_removed += removed;
        }
    }

    let obsolete_ids: Vec<&DocumentId> = obsolete.iter().map(|v| &v.id).collect();
    let mut still_referenced: HashSet<DocumentId> = HashSet::new();
    for owner in Entity::MULTILINGUAL {
        let owners = store
            .find(
                owner.collection_name(),
                &Filter::is_in(VALUES_FIELD, obsolete_ids.iter().map(|id| id.to_value())),
            )
            .await?;
        for document in owners {
            let record: MultilingualRecord = from_document(owner.collection_name(), document)?;
            still_referenced.extend(record.values);
        }
    }

    let deletable: Vec<&DocumentId> = obsolete_ids
        .into_iter()
        .filter(|id| !still_referenced.contains(*id))
        .collect();
    if !deletable.is_empty() {
        report.deleted = store
            .delete_many(
                Entity::LocationValue.collection_name(),
                &Filter::ids(deletable.iter().copied()),
            )
            .await?;
    }

    info!(
        collection,
        obsolete = obsolete.len(),
        deleted = report.deleted,
        "Obsolete language values purged"
    );
    Ok(())
}
