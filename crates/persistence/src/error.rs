//! Error types for the persistence layer.
//!
//! This module defines all error types used by the bootstrap engine, following
//! a hierarchy that separates store (backend) errors, connection lifecycle
//! errors, provisioning errors, and document validation errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
///
/// Fatal failures of `initialize()` (connection not ready, provisioning
/// exhausted) surface as one of these variants.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Store driver errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Connection lifecycle errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Collection provisioning errors
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Document validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors originating from the document store.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable (closed handle, lost server).
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The collection already exists.
    #[error("collection already exists: {collection}")]
    NamespaceExists { collection: String },

    /// The collection does not exist.
    #[error("collection not found: {collection}")]
    NamespaceNotFound { collection: String },

    /// The index does not exist on the collection.
    #[error("index not found: {collection}.{index}")]
    IndexNotFound { collection: String, index: String },

    /// An index with the same name (or key pattern) exists with other options.
    #[error("index options conflict on {collection}.{index}: {message}")]
    IndexOptionsConflict {
        collection: String,
        index: String,
        message: String,
    },

    /// The store does not support one of the requested index options.
    #[error("unsupported option '{option}' for index {collection}.{index}")]
    UnsupportedIndexOption {
        collection: String,
        index: String,
        option: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Errors related to the connection lifecycle.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// An operation required an open connection.
    #[error("not connected to the database")]
    NotConnected,
}

/// Errors raised while provisioning entity collections.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Every attempt to create the collection and its indexes failed.
    #[error("failed to provision collection {collection} after {attempts} attempts")]
    RetriesExhausted {
        collection: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },
}

/// Errors raised while validating store documents into typed records.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A document does not have the shape its collection requires.
    #[error("invalid document in {collection}: {message}")]
    InvalidDocument { collection: String, message: String },

    /// A value is not a valid document identifier.
    #[error("invalid document identifier: {value}")]
    InvalidIdentifier { value: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "mongodb".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}
