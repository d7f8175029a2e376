//! Cache → throttle → fetch → write-back pipeline behind every entity.

use crate::entity::Entity;
use crate::registry::EntityRegistry;
use crate::throttle::Throttle;
use biocyc_cache::{CacheLookup, CacheRecord, CacheStore};
use biocyc_core::{
    BiocycResult, DetailLevel, EntityFetcher, EntityIdentity, EntityPayload, FetchError,
    RetryConfig,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Shared services wired into every entity: the disk cache, the throttled
/// fetcher with its retry policy, and the identity registry.
///
/// Entities hold an `Arc` of this and the registry holds the entities;
/// the resulting reference cycle is deliberate, since both live for the
/// process lifetime anyway.
pub(crate) struct Resolver {
    cache: CacheStore,
    fetcher: Arc<dyn EntityFetcher>,
    throttle: Throttle,
    registry: EntityRegistry,
    retry: RetryConfig,
    detail: RwLock<DetailLevel>,
    /// Identities the remote has said do not exist, for this process run
    /// only. Never persisted: a stale negative entry would mask records
    /// added upstream later.
    negative: Mutex<HashSet<EntityIdentity>>,
}

impl Resolver {
    pub(crate) fn new(
        cache: CacheStore,
        fetcher: Arc<dyn EntityFetcher>,
        throttle: Throttle,
        retry: RetryConfig,
        detail: DetailLevel,
    ) -> Self {
        Self {
            cache,
            fetcher,
            throttle,
            registry: EntityRegistry::new(),
            retry,
            detail: RwLock::new(detail),
            negative: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub(crate) fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub(crate) fn detail(&self) -> DetailLevel {
        *self.detail.read().expect("detail lock poisoned")
    }

    pub(crate) fn set_detail(&self, detail: DetailLevel) {
        *self.detail.write().expect("detail lock poisoned") = detail;
    }

    /// Canonical instance for `identity`, creating it empty if needed.
    pub(crate) fn entity(engine: &Arc<Self>, identity: EntityIdentity) -> Arc<Entity> {
        engine.registry.resolve(identity, engine)
    }

    /// Populate an entity's raw attributes up to `need`: fresh cache
    /// record of sufficient detail, or throttled fetch with write-back.
    ///
    /// Failures are scoped to this identity; the entity stays registered
    /// and a later call may succeed.
    pub(crate) async fn ensure_raw(&self, entity: &Entity, need: DetailLevel) -> BiocycResult<()> {
        if entity.loaded_detail().is_some_and(|have| have >= need) {
            return Ok(());
        }

        let identity = entity.identity().clone();
        if self.is_negative(&identity) {
            debug!(%identity, "identity known missing, not re-fetching");
            return Err(FetchError::NotFound {
                org: identity.org.clone(),
                id: identity.id.clone(),
            }
            .into());
        }

        match self.cache.read(&identity) {
            CacheLookup::Fresh(record) if record.satisfies(need) => {
                entity.merge_record(record);
                return Ok(());
            }
            // Fresh but fetched at a lower detail level: the raw id lists
            // are genuinely absent upstream of us, so fall through and
            // fetch deeper.
            CacheLookup::Fresh(_) | CacheLookup::Stale(_) | CacheLookup::Missing => {}
        }

        // Relational needs always pull the full record; base loads honor
        // the context detail so callers can opt into prefetching.
        let fetch_detail = match need {
            DetailLevel::Full => DetailLevel::Full,
            _ => self.detail().max(DetailLevel::Low),
        };

        let payload = self.fetch_with_retry(&identity, fetch_detail).await?;
        let record = CacheRecord::new(payload, fetch_detail);
        if let Err(err) = self.cache.write(&identity, &record) {
            // The cache is an optimization; a write failure must not fail
            // the resolution that produced the data.
            warn!(%identity, error = %err, "cache write failed");
        }
        entity.merge_record(record);
        Ok(())
    }

    async fn fetch_with_retry(
        &self,
        identity: &EntityIdentity,
        detail: DetailLevel,
    ) -> BiocycResult<EntityPayload> {
        let mut attempt = 0u32;
        loop {
            self.throttle.acquire().await;
            debug!(%identity, attempt, "fetching record");

            match self.fetcher.fetch(identity, detail).await {
                Ok(payload) => return Ok(payload),
                Err(err @ FetchError::NotFound { .. }) => {
                    self.mark_negative(identity);
                    return Err(err.into());
                }
                Err(FetchError::Transient { reason }) if attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff_for(attempt);
                    warn!(
                        %identity,
                        attempt,
                        %reason,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn is_negative(&self, identity: &EntityIdentity) -> bool {
        self.negative
            .lock()
            .expect("negative cache lock poisoned")
            .contains(identity)
    }

    fn mark_negative(&self, identity: &EntityIdentity) {
        self.negative
            .lock()
            .expect("negative cache lock poisoned")
            .insert(identity.clone());
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("cache_root", &self.cache.root())
            .field("min_fetch_interval", &self.throttle.min_interval())
            .field("detail", &self.detail())
            .finish()
    }
}
