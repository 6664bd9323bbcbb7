//! Collection provisioning.
//!
//! Ensures each entity's collection exists, creating it together with its
//! declared indexes. Transient failures are retried with exponential backoff;
//! exhausting the attempts is fatal for the run.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::{DocumentStore, IndexSpec};
use crate::error::{BackendError, ProvisionError};
use crate::schema::{Entity, ExpirySettings};

/// Attempts and base delay of the provisioning retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub retries: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Returns the waits between attempts.
    pub fn delays(&self) -> Vec<Duration> {
        backoff_delays(self.retries, self.base_delay)
    }
}

/// Waits before attempts `2..=retries`: `base * 2^(k-2)` before attempt `k`.
pub fn backoff_delays(retries: u32, base: Duration) -> Vec<Duration> {
    (2..=retries)
        .map(|attempt| {
            let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
            base.saturating_mul(factor)
        })
        .collect()
}

/// Runs `operation` until it succeeds or the policy's attempts are exhausted.
///
/// `operation` receives the 1-based attempt number.
pub async fn with_backoff<T, F, Fut>(
    collection: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ProvisionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let attempts = policy.retries.max(1);
    let mut delays = policy.delays().into_iter();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(collection, attempts = attempt, "Provisioning succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) => {
                let Some(delay) = delays.next().filter(|_| attempt < attempts) else {
                    return Err(ProvisionError::RetriesExhausted {
                        collection: collection.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                };

                warn!(
                    collection,
                    attempt,
                    max_retries = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Provisioning attempt failed, retrying"
                );

                sleep(delay).await;
            }
        }
    }
}

/// Creates the collection of `entity` and its declared indexes unless it exists.
///
/// When an attempt creates the collection but fails while building indexes,
/// later attempts build the indexes on the collection it created.
pub async fn ensure_collection(
    store: &dyn DocumentStore,
    entity: Entity,
    indexes: &[IndexSpec],
    policy: &RetryPolicy,
) -> Result<(), ProvisionError> {
    let collection = entity.collection_name();
    let created = AtomicBool::new(false);
    let created = &created;
    with_backoff(collection, policy, |_| async move {
        let existing = store.list_collections().await?;
        if existing.iter().any(|name| name == collection) {
            if !created.load(Ordering::SeqCst) {
                info!(collection, "Collection already exists");
                return Ok(());
            }
            debug!(collection, "Resuming index build on created collection");
        } else {
            store.create_collection(collection).await?;
            created.store(true, Ordering::SeqCst);
        }

        store.create_indexes(collection, indexes).await?;
        info!(collection, indexes = indexes.len(), "Collection created");
        Ok(())
    })
    .await
}

/// Provisions every entity concurrently. The first failure fails the whole set.
pub async fn ensure_collections(
    store: &dyn DocumentStore,
    entities: &[Entity],
    expiry: &ExpirySettings,
    policy: &RetryPolicy,
) -> Result<(), ProvisionError> {
    let declared: Vec<(Entity, Vec<IndexSpec>)> = entities
        .iter()
        .map(|entity| (*entity, entity.declared_indexes(expiry)))
        .collect();

    try_join_all(
        declared
            .iter()
            .map(|(entity, indexes)| ensure_collection(store, *entity, indexes, policy)),
    )
    .await?;
    Ok(())
}
