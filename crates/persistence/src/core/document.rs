//! Schema-less documents, identifiers, and query filters.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// A schema-less store document.
pub type Document = serde_json::Map<String, Value>;

/// Name of the identifier field on every document.
pub const ID_FIELD: &str = "_id";

/// Extended-JSON key wrapping an object identifier.
const OID_KEY: &str = "$oid";

/// A 24-character hexadecimal document identifier.
///
/// Identifiers are stored in the extended-JSON form `{"$oid": "<hex>"}` so
/// documents round-trip through MongoDB as native ObjectIds. Parsing also
/// accepts a bare hex string. Hex digits are normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Parses a bare 24-character hex string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(ValidationError::InvalidIdentifier {
                value: value.to_string(),
            })
        }
    }

    /// Builds an identifier from a monotonically increasing counter.
    pub fn from_counter(counter: u64) -> Self {
        Self(format!("{:024x}", counter))
    }

    /// Extracts an identifier from a JSON value (`{"$oid": hex}` or `"hex"`).
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Object(map) => match map.get(OID_KEY) {
                Some(Value::String(s)) if map.len() == 1 => Self::parse(s),
                _ => Err(ValidationError::InvalidIdentifier {
                    value: value.to_string(),
                }),
            },
            other => Err(ValidationError::InvalidIdentifier {
                value: other.to_string(),
            }),
        }
    }

    /// Returns the extended-JSON representation.
    pub fn to_value(&self) -> Value {
        let mut map = Document::new();
        map.insert(OID_KEY.to_string(), Value::String(self.0.clone()));
        Value::Object(map)
    }

    /// Returns the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(OID_KEY, &self.0)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DocumentId::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Reads the identifier of a document.
pub fn document_id(collection: &str, document: &Document) -> Result<DocumentId, ValidationError> {
    let value = document
        .get(ID_FIELD)
        .ok_or_else(|| ValidationError::InvalidDocument {
            collection: collection.to_string(),
            message: format!("missing field '{}'", ID_FIELD),
        })?;
    DocumentId::from_value(value)
}

/// A query filter supported by every store.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals the value; against an array field, any element matches.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// Field (or any array element) is one of the values.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Field (and every array element) is none of the values.
    NotIn {
        /// Field name.
        field: String,
        /// Rejected values.
        values: Vec<Value>,
    },
}

impl Filter {
    /// Equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Membership filter.
    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::In {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Exclusion filter.
    pub fn not_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::NotIn {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Matches the document with the given identifier.
    pub fn id(id: &DocumentId) -> Self {
        Filter::eq(ID_FIELD, id.to_value())
    }

    /// Matches documents whose identifier is one of `ids`.
    pub fn ids<'a>(ids: impl IntoIterator<Item = &'a DocumentId>) -> Self {
        Filter::is_in(ID_FIELD, ids.into_iter().map(DocumentId::to_value))
    }

    /// Matches documents whose `field` references `id`.
    pub fn references(field: impl Into<String>, id: &DocumentId) -> Self {
        Filter::eq(field, id.to_value())
    }

    /// Evaluates the filter against a document using document-store semantics.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => field_matches(document.get(field), |v| v == value),
            Filter::In { field, values } => {
                field_matches(document.get(field), |v| values.contains(v))
            }
            Filter::NotIn { field, values } => {
                !field_matches(document.get(field), |v| values.contains(v))
            }
        }
    }
}

fn field_matches(field: Option<&Value>, predicate: impl Fn(&Value) -> bool) -> bool {
    match field {
        None => false,
        Some(Value::Array(items)) => {
            predicate(&Value::Array(items.clone())) || items.iter().any(&predicate)
        }
        Some(value) => predicate(value),
    }
}
