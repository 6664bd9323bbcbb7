//! Entity catalog.
//!
//! The fixed set of record kinds the marketplace stores, the collection each
//! maps to, and the indexes each declares. Text indexes are reconciled
//! separately (see [`crate::index`]) and are not part of the declared set.

mod records;

pub use records::{LocationValue, MultilingualRecord, from_document, to_document};

use crate::core::IndexSpec;

/// Language whose value backfills every other language.
pub const CANONICAL_LANGUAGE: &str = "en";

/// Timestamp field carried by expiring records.
pub const EXPIRE_AT_FIELD: &str = "expireAt";

/// Field of a multilingual record holding its value references.
pub const VALUES_FIELD: &str = "values";

/// Language field of a location value.
pub const LANGUAGE_FIELD: &str = "language";

/// Text field of a location value.
pub const VALUE_FIELD: &str = "value";

/// A domain record kind. Each maps to one collection named after the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// A rental booking.
    Booking,
    /// A country with localized names.
    Country,
    /// A location with localized names.
    Location,
    /// One localized name.
    LocationValue,
    /// A user notification.
    Notification,
    /// Unread notification count per user.
    NotificationCounter,
    /// A rental property.
    Property,
    /// A mobile push token per user.
    PushToken,
    /// An auth or verification token.
    Token,
    /// A user account.
    User,
}

impl Entity {
    /// Every entity, in collection-name order.
    pub const ALL: [Entity; 10] = [
        Entity::Booking,
        Entity::Country,
        Entity::Location,
        Entity::LocationValue,
        Entity::Notification,
        Entity::NotificationCounter,
        Entity::Property,
        Entity::PushToken,
        Entity::Token,
        Entity::User,
    ];

    /// Entities holding a sequence of [`LocationValue`] references.
    pub const MULTILINGUAL: [Entity; 2] = [Entity::Location, Entity::Country];

    /// Entities whose records expire.
    pub const EXPIRING: [Entity; 3] = [Entity::Booking, Entity::User, Entity::Token];

    /// Name of the backing collection.
    pub fn collection_name(&self) -> &'static str {
        match self {
            Entity::Booking => "Booking",
            Entity::Country => "Country",
            Entity::Location => "Location",
            Entity::LocationValue => "LocationValue",
            Entity::Notification => "Notification",
            Entity::NotificationCounter => "NotificationCounter",
            Entity::Property => "Property",
            Entity::PushToken => "PushToken",
            Entity::Token => "Token",
            Entity::User => "User",
        }
    }

    /// Configured expiry of the entity's TTL index, if it has one.
    pub fn ttl_seconds(&self, expiry: &ExpirySettings) -> Option<u64> {
        match self {
            Entity::Booking => Some(expiry.booking),
            Entity::User => Some(expiry.user),
            Entity::Token => Some(expiry.token),
            _ => None,
        }
    }

    /// Regular and TTL indexes the entity's collection must carry.
    pub fn declared_indexes(&self, expiry: &ExpirySettings) -> Vec<IndexSpec> {
        let mut indexes = match self {
            Entity::Booking => vec![
                IndexSpec::ascending("property"),
                IndexSpec::ascending("agency"),
                IndexSpec::ascending("renter"),
            ],
            Entity::Country => vec![IndexSpec::ascending(VALUES_FIELD)],
            Entity::Location => vec![
                IndexSpec::ascending(VALUES_FIELD),
                IndexSpec::ascending("country"),
            ],
            Entity::LocationValue => vec![IndexSpec::ascending(LANGUAGE_FIELD)],
            Entity::Notification => vec![
                IndexSpec::ascending("user"),
                IndexSpec::ascending("booking"),
            ],
            Entity::NotificationCounter => vec![IndexSpec::ascending("user").unique()],
            Entity::Property => vec![
                IndexSpec::ascending("agency"),
                IndexSpec::ascending("location"),
            ],
            Entity::PushToken => vec![IndexSpec::ascending("user").unique()],
            Entity::Token => vec![IndexSpec::ascending("user")],
            Entity::User => vec![IndexSpec::ascending("email").unique()],
        };
        if let Some(seconds) = self.ttl_seconds(expiry) {
            indexes.push(IndexSpec::ttl(EXPIRE_AT_FIELD, seconds));
        }
        indexes
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection_name())
    }
}

/// TTL durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirySettings {
    /// Unpaid booking expiry.
    pub booking: u64,
    /// Unverified user expiry.
    pub user: u64,
    /// Auth token expiry.
    pub token: u64,
}

/// A full-text index reconciled with the language-agnostic policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextIndexTarget {
    /// Owning entity.
    pub entity: Entity,
    /// Indexed field.
    pub field: &'static str,
    /// Index name.
    pub index_name: &'static str,
}

/// The full-text indexes every deployment carries.
pub const TEXT_INDEXES: [TextIndexTarget; 2] = [
    TextIndexTarget {
        entity: Entity::Property,
        field: "name",
        index_name: "name_text",
    },
    TextIndexTarget {
        entity: Entity::LocationValue,
        field: VALUE_FIELD,
        index_name: "value_text",
    },
];

/// Name of the TTL index on expiring entities.
pub fn ttl_index_name() -> String {
    format!("{}_1", EXPIRE_AT_FIELD)
}
