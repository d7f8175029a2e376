//! Process-wide identity map from entity identity to the single live
//! instance.

use crate::entity::Entity;
use crate::resolver::Resolver;
use biocyc_core::EntityIdentity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Identity map guaranteeing at most one in-memory `Entity` per
/// `(organism, frame)` pair.
///
/// `resolve` returns the in-progress instance for identities that are
/// already known, which is what terminates cyclic reference chains: a
/// reference list that transitively points back at its owner resolves to
/// the owner itself instead of recursing.
///
/// The map grows monotonically for the process lifetime. Eviction would
/// break reference identity, and the upstream databases are bounded.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: Mutex<HashMap<EntityIdentity, Arc<Entity>>>,
}

impl EntityRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Look up or create the canonical instance for `identity`. Creation
    /// performs no I/O and populates no attributes.
    pub(crate) fn resolve(&self, identity: EntityIdentity, engine: &Arc<Resolver>) -> Arc<Entity> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        if let Some(existing) = entries.get(&identity) {
            return Arc::clone(existing);
        }

        let entity = Arc::new(Entity::new(identity.clone(), Arc::clone(engine)));
        entries.insert(identity, Arc::clone(&entity));
        entity
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::throttle::Throttle;
    use biocyc_cache::CacheStore;
    use biocyc_core::{DetailLevel, EntityKind, RetryConfig};
    use biocyc_test_utils::MockFetcher;
    use std::time::Duration;

    fn engine() -> (Arc<Resolver>, Arc<MockFetcher>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let resolver = Arc::new(Resolver::new(
            CacheStore::new(dir.path(), Duration::from_secs(3600)),
            fetcher.clone(),
            Throttle::new(Duration::ZERO),
            RetryConfig::default(),
            DetailLevel::Low,
        ));
        (resolver, fetcher, dir)
    }

    #[test]
    fn test_resolve_twice_returns_identical_instance() {
        let (engine, _fetcher, _dir) = engine();
        let identity = EntityIdentity::new("META", "L-LACTATE");

        let first = Resolver::entity(&engine, identity.clone());
        let second = Resolver::entity(&engine, identity);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn test_resolve_constructs_empty_without_io() {
        let (engine, fetcher, _dir) = engine();
        let entity = Resolver::entity(&engine, EntityIdentity::new("META", "RXN-9083"));

        assert_eq!(entity.kind(), EntityKind::Unknown);
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[test]
    fn test_same_frame_in_different_organisms_is_distinct() {
        let (engine, _fetcher, _dir) = engine();

        let meta = Resolver::entity(&engine, EntityIdentity::new("META", "PWY-A"));
        let ecoli = Resolver::entity(&engine, EntityIdentity::new("ECOLI", "PWY-A"));

        assert!(!Arc::ptr_eq(&meta, &ecoli));
        assert_eq!(engine.registry().len(), 2);
    }
}
