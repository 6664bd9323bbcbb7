//! MongoDB backend implementation.
//!
//! Built on the official `mongodb` driver. Documents cross the boundary as
//! extended JSON, so `{"$oid": ...}` identifiers become native ObjectIds.
//!
//! # Connection
//!
//! The connection URI must name the database, e.g.
//! `mongodb://127.0.0.1:27017/movinin?authSource=admin`. When TLS material is
//! supplied it is applied as `tlsCertificateKeyFile` and `tlsCAFile`. A `ping`
//! on the database confirms the connection before the store is handed out.
//!
//! # Error Mapping
//!
//! | Server code | Error |
//! |-------------|-------|
//! | 26 `NamespaceNotFound` | [`BackendError::NamespaceNotFound`](crate::error::BackendError::NamespaceNotFound) |
//! | 27 `IndexNotFound` | [`BackendError::IndexNotFound`](crate::error::BackendError::IndexNotFound) |
//! | 48 `NamespaceExists` | [`BackendError::NamespaceExists`](crate::error::BackendError::NamespaceExists) |
//! | 85/86 index conflicts | [`BackendError::IndexOptionsConflict`](crate::error::BackendError::IndexOptionsConflict) |

mod backend;
mod convert;

pub use backend::{MongoConnector, MongoStore};
