//! Initialization orchestrator.
//!
//! [`Initializer::initialize`] runs once at startup, after a successful
//! connect:
//!
//! 1. Require an open connection (fatal otherwise).
//! 2. Provision every entity collection concurrently (fatal on exhaustion).
//! 3. Reconcile the full-text indexes concurrently (non-fatal).
//! 4. Reconcile the TTL indexes concurrently (non-fatal).
//! 5. Synchronize locations and countries concurrently.
//! 6. Reclaim orphan location values, when enabled.
//!
//! The result is the conjunction of steps 5 and 6. A fatal failure closes the
//! connection and yields `false`.

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::connection::ConnectionManager;
use crate::core::DocumentStore;
use crate::error::StorageResult;
use crate::index::{TextIndexOutcome, ensure_text_index, ensure_ttl};
use crate::provision::ensure_collections;
use crate::schema::{Entity, TEXT_INDEXES, ttl_index_name};
use crate::sync::{reclaim_orphan_values, sync_languages};

/// Sequences provisioning, index reconciliation, and data synchronization.
#[derive(Debug)]
pub struct Initializer<'a> {
    connection: &'a ConnectionManager,
    config: &'a DatabaseConfig,
}

impl<'a> Initializer<'a> {
    /// Creates an initializer over a connection and its configuration.
    pub fn new(connection: &'a ConnectionManager, config: &'a DatabaseConfig) -> Self {
        Self { connection, config }
    }

    /// Brings the database in line with the configuration.
    ///
    /// Returns `true` when every synchronization step succeeded.
    pub async fn initialize(&self) -> bool {
        match self.run().await {
            Ok(success) => success,
            Err(e) => {
                error!(error = %e, "Database initialization failed");
                if let Err(close_err) = self.connection.close(false).await {
                    error!(error = %close_err, "Failed to close the connection after initialization failure");
                }
                false
            }
        }
    }

    async fn run(&self) -> StorageResult<bool> {
        let store = self.connection.store()?;
        let store = store.as_ref();
        let expiry = self.config.expiry();

        ensure_collections(store, &Entity::ALL, &expiry, &self.config.retry_policy()).await?;
        info!(collections = Entity::ALL.len(), "Collections provisioned");

        self.reconcile_text_indexes(store).await;
        self.reconcile_ttl_indexes(store).await;

        let mut success = self.sync_multilingual(store).await;

        if self.config.reclaim_orphan_values {
            if let Err(e) = reclaim_orphan_values(store).await {
                error!(error = %e, "Orphan value reclamation failed");
                success = false;
            }
        }

        if success {
            info!("Database initialized");
        } else {
            warn!("Database initialized with errors");
        }
        Ok(success)
    }

    async fn reconcile_text_indexes(&self, store: &dyn DocumentStore) {
        let outcomes = join_all(TEXT_INDEXES.iter().map(|target| {
            ensure_text_index(store, target.entity, target.field, target.index_name)
        }))
        .await;

        for (target, outcome) in TEXT_INDEXES.iter().zip(outcomes) {
            if outcome == TextIndexOutcome::Failed {
                warn!(
                    collection = target.entity.collection_name(),
                    index = target.index_name,
                    "Text index left unreconciled"
                );
            }
        }
    }

    async fn reconcile_ttl_indexes(&self, store: &dyn DocumentStore) {
        let expiry = self.config.expiry();
        let index_name = ttl_index_name();
        let targets: Vec<(Entity, u64)> = Entity::EXPIRING
            .iter()
            .filter_map(|entity| entity.ttl_seconds(&expiry).map(|seconds| (*entity, seconds)))
            .collect();
        let declared: Vec<_> = targets
            .iter()
            .map(|(entity, _)| entity.declared_indexes(&expiry))
            .collect();

        let results = join_all(targets.iter().zip(&declared).map(
            |((entity, seconds), declared)| {
                ensure_ttl(store, *entity, &index_name, *seconds, declared)
            },
        ))
        .await;

        for ((entity, _), result) in targets.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    collection = entity.collection_name(),
                    index = %index_name,
                    error = %e,
                    "TTL index reconciliation failed"
                );
            }
        }
    }

    async fn sync_multilingual(&self, store: &dyn DocumentStore) -> bool {
        let languages = &self.config.languages;
        let results = join_all(
            Entity::MULTILINGUAL
                .iter()
                .map(|entity| sync_languages(store, *entity, languages)),
        )
        .await;

        let mut success = true;
        for (entity, result) in Entity::MULTILINGUAL.iter().zip(results) {
            match result {
                Ok(report) => info!(
                    collection = entity.collection_name(),
                    scanned = report.scanned,
                    skipped = report.skipped,
                    created = report.created,
                    references_removed = report.references_removed,
                    deleted = report.deleted,
                    "Languages synchronized"
                ),
                Err(e) => {
                    error!(collection = entity.collection_name(), error = %e, "Language synchronization failed");
                    success = false;
                }
            }
        }
        success
    }
}
