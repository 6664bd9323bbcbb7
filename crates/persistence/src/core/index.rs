//! Index descriptors.
//!
//! An [`IndexSpec`] describes both a declared index (what the engine wants) and
//! a live index (what the store reports). Reconcilers compare the two and drop
//! and recreate on drift; indexes are never altered in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default language of full-text indexes that must not stem or drop stop words.
pub const TEXT_DEFAULT_LANGUAGE: &str = "none";

/// Language-override field that no document carries, disabling per-document
/// language detection.
pub const LANGUAGE_OVERRIDE_SENTINEL: &str = "_none";

/// Direction or type of one key in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKey {
    /// Ascending (`1`).
    Ascending,
    /// Descending (`-1`).
    Descending,
    /// Full-text (`"text"`).
    Text,
}

/// Kind of an index, derived from its keys and options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Plain or unique index.
    Regular,
    /// Full-text index.
    Text,
    /// Time-to-live index on a timestamp field.
    Ttl,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Regular => write!(f, "regular"),
            IndexKind::Text => write!(f, "text"),
            IndexKind::Ttl => write!(f, "ttl"),
        }
    }
}

/// Options attached to an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Reject duplicate keys.
    #[serde(default)]
    pub unique: bool,
    /// Build without blocking the collection.
    #[serde(default)]
    pub background: bool,
    /// Expiry in seconds after the indexed timestamp (TTL indexes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after_seconds: Option<u64>,
    /// Default language of a text index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    /// Document field naming the language of a text index entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_override: Option<String>,
    /// Field weights of a text index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, i32>>,
}

/// A named index over one or more keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name, unique per collection.
    pub name: String,
    /// Ordered index keys.
    pub keys: Vec<(String, IndexKey)>,
    /// Index options.
    #[serde(default)]
    pub options: IndexOptions,
}

impl IndexSpec {
    /// Ascending single-field index named `<field>_1`.
    pub fn ascending(field: &str) -> Self {
        Self {
            name: format!("{}_1", field),
            keys: vec![(field.to_string(), IndexKey::Ascending)],
            options: IndexOptions::default(),
        }
    }

    /// TTL index on a timestamp field.
    pub fn ttl(field: &str, expire_after_seconds: u64) -> Self {
        let mut index = Self::ascending(field);
        index.options.expire_after_seconds = Some(expire_after_seconds);
        index
    }

    /// Background text index on one field with weight 1.
    pub fn text(field: &str, name: &str) -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(field.to_string(), 1);
        Self {
            name: name.to_string(),
            keys: vec![(field.to_string(), IndexKey::Text)],
            options: IndexOptions {
                background: true,
                weights: Some(weights),
                ..Default::default()
            },
        }
    }

    /// Marks the index unique.
    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    /// Renames the index.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Applies the language-agnostic text options.
    pub fn with_language_fallback(mut self) -> Self {
        self.options.default_language = Some(TEXT_DEFAULT_LANGUAGE.to_string());
        self.options.language_override = Some(LANGUAGE_OVERRIDE_SENTINEL.to_string());
        self
    }

    /// Returns the kind of this index.
    pub fn kind(&self) -> IndexKind {
        if self.keys.iter().any(|(_, key)| *key == IndexKey::Text) {
            IndexKind::Text
        } else if self.options.expire_after_seconds.is_some() {
            IndexKind::Ttl
        } else {
            IndexKind::Regular
        }
    }

    /// Returns the first indexed field.
    pub fn field(&self) -> Option<&str> {
        self.keys.first().map(|(field, _)| field.as_str())
    }

    /// Whether the language-handling options equal the language-agnostic ones.
    pub fn has_language_fallback(&self) -> bool {
        self.options.default_language.as_deref() == Some(TEXT_DEFAULT_LANGUAGE)
            && self.options.language_override.as_deref() == Some(LANGUAGE_OVERRIDE_SENTINEL)
    }
}
