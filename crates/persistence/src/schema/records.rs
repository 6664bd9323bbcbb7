//! Typed records validated from store documents.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Document, DocumentId};
use crate::error::ValidationError;

use super::{LANGUAGE_FIELD, VALUE_FIELD};

/// One localized name, referenced by a multilingual record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationValue {
    /// Document identifier.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Language code.
    pub language: String,
    /// Localized text.
    pub value: String,
}

impl LocationValue {
    /// Builds the document of a new value; the store assigns its identifier.
    pub fn new_document(language: &str, value: &str) -> Document {
        let mut document = Document::new();
        document.insert(LANGUAGE_FIELD.to_string(), Value::String(language.to_string()));
        document.insert(VALUE_FIELD.to_string(), Value::String(value.to_string()));
        document
    }
}

/// A location or country: an ordered sequence of value references plus any
/// other fields, which are preserved verbatim on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilingualRecord {
    /// Document identifier.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// References to [`LocationValue`] documents.
    #[serde(default)]
    pub values: Vec<DocumentId>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Document,
}

impl MultilingualRecord {
    /// Appends a reference unless it is already present.
    pub fn push_value(&mut self, id: DocumentId) -> bool {
        if self.values.contains(&id) {
            false
        } else {
            self.values.push(id);
            true
        }
    }

    /// Removes every occurrence of a reference, returning how many were removed.
    pub fn remove_value(&mut self, id: &DocumentId) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v != id);
        before - self.values.len()
    }
}

/// Validates a store document into a typed record.
pub fn from_document<T: DeserializeOwned>(
    collection: &str,
    document: Document,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(document)).map_err(|e| ValidationError::InvalidDocument {
        collection: collection.to_string(),
        message: e.to_string(),
    })
}

/// Serializes a typed record back into a store document.
pub fn to_document<T: Serialize>(collection: &str, record: &T) -> Result<Document, ValidationError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(ValidationError::InvalidDocument {
            collection: collection.to_string(),
            message: format!("expected an object, found {}", other),
        }),
        Err(e) => Err(ValidationError::InvalidDocument {
            collection: collection.to_string(),
            message: e.to_string(),
        }),
    }
}
