//! Conversions between engine types and BSON.

use std::collections::BTreeMap;
use std::time::Duration;

use ::mongodb::IndexModel;
use ::mongodb::bson::oid::ObjectId;
use ::mongodb::bson::{Bson, Document as BsonDocument, doc};
use ::mongodb::error::{Error as MongoError, ErrorKind};
use ::mongodb::options::IndexOptions as MongoIndexOptions;
use serde_json::Value;

use crate::core::{Document, DocumentId, Filter, IndexKey, IndexOptions, IndexSpec};
use crate::error::BackendError;

pub(crate) const BACKEND_NAME: &str = "mongodb";

/// Server error codes the engine distinguishes.
pub(crate) mod codes {
    pub const NAMESPACE_NOT_FOUND: i32 = 26;
    pub const INDEX_NOT_FOUND: i32 = 27;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
    pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
    pub const BAD_VALUE: i32 = 2;
    pub const CANNOT_CREATE_INDEX: i32 = 67;
}

/// Returns the server error code of a command failure.
pub(crate) fn command_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

pub(crate) fn internal(message: impl Into<String>, err: MongoError) -> BackendError {
    BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message: format!("{}: {}", message.into(), err),
        source: Some(Box::new(err)),
    }
}

pub(crate) fn serialization(message: impl std::fmt::Display) -> BackendError {
    BackendError::SerializationError {
        message: message.to_string(),
    }
}

/// Converts a JSON document (extended JSON allowed) into BSON.
pub(crate) fn to_bson_document(document: Document) -> Result<BsonDocument, BackendError> {
    match Bson::try_from(Value::Object(document)).map_err(serialization)? {
        Bson::Document(document) => Ok(document),
        other => Err(serialization(format!("expected a document, found {}", other))),
    }
}

/// Converts a BSON document into relaxed extended JSON.
pub(crate) fn from_bson_document(document: BsonDocument) -> Result<Document, BackendError> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(serialization(format!("expected an object, found {}", other))),
    }
}

pub(crate) fn to_bson(value: &Value) -> Result<Bson, BackendError> {
    Bson::try_from(value.clone()).map_err(serialization)
}

pub(crate) fn object_id(id: &DocumentId) -> Result<ObjectId, BackendError> {
    ObjectId::parse_str(id.as_str()).map_err(serialization)
}

pub(crate) fn document_id(bson: &Bson) -> Result<DocumentId, BackendError> {
    match bson {
        Bson::ObjectId(oid) => DocumentId::parse(&oid.to_hex()).map_err(serialization),
        other => Err(serialization(format!("unsupported identifier {}", other))),
    }
}

/// Translates a filter into a query document.
pub(crate) fn filter_document(filter: &Filter) -> Result<BsonDocument, BackendError> {
    Ok(match filter {
        Filter::All => BsonDocument::new(),
        Filter::Eq { field, value } => {
            let mut query = BsonDocument::new();
            query.insert(field.clone(), to_bson(value)?);
            query
        }
        Filter::In { field, values } => {
            let values = values.iter().map(to_bson).collect::<Result<Vec<_>, _>>()?;
            let mut query = BsonDocument::new();
            query.insert(field.clone(), doc! { "$in": values });
            query
        }
        Filter::NotIn { field, values } => {
            let values = values.iter().map(to_bson).collect::<Result<Vec<_>, _>>()?;
            let mut query = BsonDocument::new();
            query.insert(field.clone(), doc! { "$nin": values });
            query
        }
    })
}

/// Builds the driver index model of a descriptor.
pub(crate) fn index_model(index: &IndexSpec) -> IndexModel {
    let mut keys = BsonDocument::new();
    for (field, key) in &index.keys {
        let direction = match key {
            IndexKey::Ascending => Bson::Int32(1),
            IndexKey::Descending => Bson::Int32(-1),
            IndexKey::Text => Bson::String("text".to_string()),
        };
        keys.insert(field.clone(), direction);
    }

    let mut options = MongoIndexOptions::default();
    options.name = Some(index.name.clone());
    if index.options.unique {
        options.unique = Some(true);
    }
    if index.options.background {
        options.background = Some(true);
    }
    options.expire_after = index.options.expire_after_seconds.map(Duration::from_secs);
    options.default_language = index.options.default_language.clone();
    options.language_override = index.options.language_override.clone();
    options.weights = index.options.weights.as_ref().map(|weights| {
        weights
            .iter()
            .map(|(field, weight)| (field.clone(), Bson::Int32(*weight)))
            .collect()
    });

    let mut model = IndexModel::default();
    model.keys = keys;
    model.options = Some(options);
    model
}

/// Reads a live index reported by the server.
///
/// Text indexes are reported with the internal `_fts`/`_ftsx` keys; their
/// fields are recovered from the weights.
pub(crate) fn index_spec(model: IndexModel) -> IndexSpec {
    let options = model.options.unwrap_or_default();
    let weights: Option<BTreeMap<String, i32>> = options.weights.as_ref().map(|weights| {
        weights
            .iter()
            .map(|(field, weight)| (field.clone(), bson_number(weight) as i32))
            .collect()
    });

    let keys = if model.keys.contains_key("_fts") {
        weights
            .iter()
            .flat_map(|w| w.keys())
            .map(|field| (field.clone(), IndexKey::Text))
            .collect()
    } else {
        model
            .keys
            .iter()
            .map(|(field, direction)| {
                let key = match direction {
                    Bson::String(kind) if kind == "text" => IndexKey::Text,
                    other if bson_number(other) < 0 => IndexKey::Descending,
                    _ => IndexKey::Ascending,
                };
                (field.clone(), key)
            })
            .collect()
    };

    IndexSpec {
        name: options.name.clone().unwrap_or_default(),
        keys,
        options: IndexOptions {
            unique: options.unique.unwrap_or(false),
            background: options.background.unwrap_or(false),
            expire_after_seconds: options.expire_after.map(|d| d.as_secs()),
            default_language: options.default_language.clone(),
            language_override: options.language_override.clone(),
            weights,
        },
    }
}

fn bson_number(value: &Bson) -> i64 {
    match value {
        Bson::Int32(v) => i64::from(*v),
        Bson::Int64(v) => *v,
        Bson::Double(v) => *v as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_id_round_trip() {
        let id = DocumentId::parse("65a1b2c3d4e5f60718293a4b").unwrap();
        let oid = object_id(&id).unwrap();
        assert_eq!(document_id(&Bson::ObjectId(oid)).unwrap(), id);
    }

    #[test]
    fn test_extended_json_ids_become_object_ids() {
        let id = DocumentId::parse("65a1b2c3d4e5f60718293a4b").unwrap();
        let document = json!({"_id": id.to_value(), "values": [id.to_value()]});
        let bson = to_bson_document(document.as_object().cloned().unwrap()).unwrap();
        assert!(matches!(bson.get("_id"), Some(Bson::ObjectId(_))));

        let back = from_bson_document(bson).unwrap();
        assert_eq!(back.get("_id"), Some(&id.to_value()));
    }

    #[test]
    fn test_filter_documents() {
        assert_eq!(filter_document(&Filter::All).unwrap(), doc! {});
        assert_eq!(
            filter_document(&Filter::eq("language", "en")).unwrap(),
            doc! { "language": "en" }
        );
        assert_eq!(
            filter_document(&Filter::not_in("language", [json!("en"), json!("fr")])).unwrap(),
            doc! { "language": { "$nin": ["en", "fr"] } }
        );
    }

    #[test]
    fn test_index_model_ttl() {
        let model = index_model(&IndexSpec::ttl("expireAt", 7200));
        assert_eq!(model.keys, doc! { "expireAt": 1 });
        let options = model.options.unwrap();
        assert_eq!(options.name.as_deref(), Some("expireAt_1"));
        assert_eq!(options.expire_after, Some(Duration::from_secs(7200)));
    }

    #[test]
    fn test_index_spec_from_live_text_index() {
        let mut options = MongoIndexOptions::default();
        options.name = Some("value_text".to_string());
        options.default_language = Some("none".to_string());
        options.language_override = Some("_none".to_string());
        options.weights = Some(doc! { "value": 1 });
        let mut model = IndexModel::default();
        model.keys = doc! { "_fts": "text", "_ftsx": 1 };
        model.options = Some(options);

        let spec = index_spec(model);
        assert_eq!(spec.name, "value_text");
        assert_eq!(spec.keys, vec![("value".to_string(), IndexKey::Text)]);
        assert!(spec.has_language_fallback());
    }
}
