//! The database context: default organism, detail level, and the entry
//! points that produce root entities.

use crate::entity::Entity;
use crate::http::HttpFetcher;
use crate::resolver::Resolver;
use crate::throttle::Throttle;
use biocyc_cache::CacheStore;
use biocyc_core::{
    BiocycConfig, BiocycResult, ConfigError, DetailLevel, EntityFetcher, EntityIdentity, FrameId,
    OrgId,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Handle on one remote database with its cache, throttle, and identity
/// registry. All services are owned by the context rather than being
/// process globals, so isolated instances can coexist (and be tested)
/// while each context keeps the one-shared-budget semantic.
///
/// # Example
/// ```ignore
/// let db = BioCyc::new(BiocycConfig::default())?;
/// db.set_organism("META");
/// let lactate = db.get("L-LACTATE").await?;
/// for reaction in lactate.reactions().await? {
///     println!("{}", reaction.frame_id());
/// }
/// ```
#[derive(Debug)]
pub struct BioCyc {
    engine: Arc<Resolver>,
    default_org: RwLock<OrgId>,
}

impl BioCyc {
    /// Build a context talking to the real web service.
    pub fn new(config: BiocycConfig) -> BiocycResult<Self> {
        let fetcher = HttpFetcher::new(config.base_url.as_str())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build a context with a caller-supplied fetcher. This is the seam
    /// tests use to count and script fetches.
    pub fn with_fetcher(
        config: BiocycConfig,
        fetcher: Arc<dyn EntityFetcher>,
    ) -> BiocycResult<Self> {
        config.validate()?;

        let cache = CacheStore::new(&config.cache_dir, config.ttl)
            .with_fallbacks(config.extra_cache_paths.clone());
        let throttle = Throttle::new(config.min_fetch_interval);
        let engine = Arc::new(Resolver::new(
            cache,
            fetcher,
            throttle,
            config.retry.clone(),
            config.detail,
        ));

        Ok(Self {
            engine,
            default_org: RwLock::new(config.default_organism),
        })
    }

    /// Organism used by top-level `get` calls.
    pub fn organism(&self) -> OrgId {
        self.default_org.read().expect("organism lock poisoned").clone()
    }

    /// Change the default organism. Affects only subsequent top-level
    /// `get` calls; entities already constructed keep their organism, and
    /// reference resolution always inherits the referencing entity's
    /// organism.
    pub fn set_organism(&self, org: impl Into<OrgId>) {
        *self.default_org.write().expect("organism lock poisoned") = org.into();
    }

    pub fn detail(&self) -> DetailLevel {
        self.engine.detail()
    }

    /// Change the detail level requested from the remote service on
    /// subsequent fetches.
    pub fn set_detail(&self, detail: DetailLevel) {
        self.engine.set_detail(detail);
    }

    pub fn ttl(&self) -> Duration {
        self.engine.cache().ttl()
    }

    /// Change the record expiry applied by subsequent cache reads.
    pub fn set_ttl(&self, ttl: Duration) -> BiocycResult<()> {
        if ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ttl".to_string(),
                value: format!("{:?}", ttl),
                reason: "ttl must be positive".to_string(),
            }
            .into());
        }
        self.engine.cache().set_ttl(ttl);
        Ok(())
    }

    /// Number of entities the registry currently holds.
    pub fn registry_len(&self) -> usize {
        self.engine.registry().len()
    }

    /// Root lookup in the default organism. Ensures base attributes are
    /// populated through the cache-or-fetch path, so a bogus id surfaces
    /// `NotFound` here rather than on first attribute access.
    pub async fn get(&self, id: impl Into<FrameId>) -> BiocycResult<Arc<Entity>> {
        let org = self.organism();
        self.get_for_org(org, id).await
    }

    /// Root lookup in an explicit organism.
    pub async fn get_for_org(
        &self,
        org: impl Into<OrgId>,
        id: impl Into<FrameId>,
    ) -> BiocycResult<Arc<Entity>> {
        let identity = EntityIdentity::new(org, id);
        let entity = Resolver::entity(&self.engine, identity);
        entity.ensure_loaded().await?;
        Ok(entity)
    }

    /// Root lookup of several ids in the default organism, in order.
    /// Fails on the first id that fails.
    pub async fn get_many(&self, ids: &[&str]) -> BiocycResult<Vec<Arc<Entity>>> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            entities.push(self.get(*id).await?);
        }
        Ok(entities)
    }
}
