//! MongoDB store and connector.

use std::sync::Arc;

use ::mongodb::bson::oid::ObjectId;
use ::mongodb::bson::{Document as BsonDocument, doc};
use ::mongodb::error::Error as MongoError;
use ::mongodb::options::{ClientOptions, Tls, TlsOptions as MongoTlsOptions};
use ::mongodb::{Client, Collection, Database};
use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, info};

use crate::core::{
    BackendKind, ConnectOptions, Connector, Document, DocumentId, DocumentStore, Filter, ID_FIELD,
    IndexSpec,
};
use crate::error::BackendError;

use super::convert::{
    BACKEND_NAME, codes, command_code, document_id, filter_document, from_bson_document,
    index_model, index_spec, internal, object_id, to_bson_document,
};

/// Opens [`MongoStore`]s.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector;

impl MongoConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MongoConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDB
    }

    async fn connect(
        &self,
        uri: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn DocumentStore>, BackendError> {
        let store = MongoStore::connect(uri, options).await?;
        Ok(Arc::new(store))
    }
}

/// A MongoDB database opened on the default database of the connection URI.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connects, applies TLS, and pings the default database.
    pub async fn connect(uri: &str, options: &ConnectOptions) -> Result<Self, BackendError> {
        let mut client_options =
            ClientOptions::parse(uri)
                .await
                .map_err(|e| BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("invalid connection string: {}", e),
                })?;

        if let Some(tls) = &options.tls {
            let mut tls_options = MongoTlsOptions::default();
            tls_options.cert_key_file_path = Some(tls.cert_key_file.clone());
            tls_options.ca_file_path = Some(tls.ca_file.clone());
            client_options.tls = Some(Tls::Enabled(tls_options));
        }

        let database_name =
            client_options
                .default_database
                .clone()
                .ok_or_else(|| BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: "connection string does not name a database".to_string(),
                })?;

        let client =
            Client::with_options(client_options).map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })?;
        let database = client.database(&database_name);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("ping failed: {}", e),
            })?;

        info!(database = %database_name, tls = options.tls.is_some(), "MongoDB connection open");
        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }
}

fn index_error(collection: &str, index: &IndexSpec, err: MongoError) -> BackendError {
    match command_code(&err) {
        Some(codes::INDEX_OPTIONS_CONFLICT) | Some(codes::INDEX_KEY_SPECS_CONFLICT) => {
            BackendError::IndexOptionsConflict {
                collection: collection.to_string(),
                index: index.name.clone(),
                message: err.to_string(),
            }
        }
        Some(codes::BAD_VALUE) | Some(codes::CANNOT_CREATE_INDEX)
            if index.options.language_override.is_some() =>
        {
            BackendError::UnsupportedIndexOption {
                collection: collection.to_string(),
                index: index.name.clone(),
                option: "language_override".to_string(),
            }
        }
        _ => internal(format!("createIndex {}.{}", collection, index.name), err),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDB
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        self.database
            .list_collection_names()
            .await
            .map_err(|e| internal("listCollections", e))
    }

    async fn create_collection(&self, name: &str) -> Result<(), BackendError> {
        self.database
            .create_collection(name)
            .await
            .map_err(|e| match command_code(&e) {
                Some(codes::NAMESPACE_EXISTS) => BackendError::NamespaceExists {
                    collection: name.to_string(),
                },
                _ => internal(format!("createCollection {}", name), e),
            })
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, BackendError> {
        let map_err = |e: MongoError| match command_code(&e) {
            Some(codes::NAMESPACE_NOT_FOUND) => BackendError::NamespaceNotFound {
                collection: collection.to_string(),
            },
            _ => internal(format!("listIndexes {}", collection), e),
        };
        let cursor = self
            .collection(collection)
            .list_indexes()
            .await
            .map_err(map_err)?;
        let models: Vec<_> = cursor.try_collect().await.map_err(map_err)?;
        Ok(models.into_iter().map(index_spec).collect())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), BackendError> {
        self.collection(collection)
            .create_index(index_model(index))
            .await
            .map_err(|e| index_error(collection, index, e))?;
        debug!(collection, index = %index.name, "index built");
        Ok(())
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> Result<(), BackendError> {
        if indexes.is_empty() {
            return Ok(());
        }
        self.collection(collection)
            .create_indexes(indexes.iter().map(index_model))
            .await
            .map_err(|e| internal(format!("createIndexes {}", collection), e))?;
        Ok(())
    }

    async fn drop_index(&self, collection: &str, name: &str) -> Result<(), BackendError> {
        self.collection(collection)
            .drop_index(name)
            .await
            .map_err(|e| match command_code(&e) {
                Some(codes::INDEX_NOT_FOUND) => BackendError::IndexNotFound {
                    collection: collection.to_string(),
                    index: name.to_string(),
                },
                Some(codes::NAMESPACE_NOT_FOUND) => BackendError::NamespaceNotFound {
                    collection: collection.to_string(),
                },
                _ => internal(format!("dropIndex {}.{}", collection, name), e),
            })
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, BackendError> {
        let cursor = self
            .collection(collection)
            .find(filter_document(filter)?)
            .await
            .map_err(|e| internal(format!("find {}", collection), e))?;
        let documents: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| internal(format!("find {}", collection), e))?;
        documents.into_iter().map(from_bson_document).collect()
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, BackendError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": object_id(id)? })
            .await
            .map_err(|e| internal(format!("findOne {}", collection), e))?;
        found.map(from_bson_document).transpose()
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, BackendError> {
        let mut document = to_bson_document(document)?;
        if !document.contains_key(ID_FIELD) {
            document.insert(ID_FIELD, ObjectId::new());
        }
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| internal(format!("insertOne {}", collection), e))?;
        document_id(&result.inserted_id)
    }

    async fn save(
        &self,
        collection: &str,
        id: &DocumentId,
        document: Document,
    ) -> Result<(), BackendError> {
        let oid = object_id(id)?;
        let mut replacement = to_bson_document(document)?;
        replacement.insert(ID_FIELD, oid);
        let result = self
            .collection(collection)
            .replace_one(doc! { "_id": oid }, replacement)
            .await
            .map_err(|e| internal(format!("replaceOne {}", collection), e))?;
        if result.matched_count == 0 {
            return Err(BackendError::QueryError {
                message: format!("no document {} in {}", id, collection),
            });
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, BackendError> {
        let result = self
            .collection(collection)
            .delete_many(filter_document(filter)?)
            .await
            .map_err(|e| internal(format!("deleteMany {}", collection), e))?;
        Ok(result.deleted_count)
    }

    async fn close(&self, force: bool) -> Result<(), BackendError> {
        self.client.clone().shutdown().immediate(force).await;
        Ok(())
    }
}
