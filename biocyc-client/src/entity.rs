//! The resolvable entity object and its lazy attribute protocol.

use crate::resolver::Resolver;
use biocyc_core::{
    dblink_url, is_applicable, AttrMap, AttrName, AttrShape, AttrValue, BiocycResult,
    DetailLevel, EntityIdentity, EntityKind, FrameId, OrgId, SchemaError,
};
use biocyc_cache::CacheRecord;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One database record, shared process-wide through the registry.
///
/// State is populated incrementally: nothing is fetched at construction,
/// the raw attribute mapping arrives with the first attribute access, and
/// each relational attribute is materialized into entity references once
/// and memoized for the lifetime of the instance. Expiry of the backing
/// cache record never re-resolves an already-materialized attribute;
/// staleness is only observed by fresh root lookups.
pub struct Entity {
    identity: EntityIdentity,
    engine: Arc<Resolver>,
    state: RwLock<EntityState>,
}

struct EntityState {
    kind: EntityKind,
    /// Highest detail level the raw mapping has been populated at, or
    /// `None` before the first load. Base attributes arrive at `Low`;
    /// relational reference lists require `Full`.
    loaded: Option<DetailLevel>,
    raw: AttrMap,
    resolved: BTreeMap<AttrName, Vec<Arc<Entity>>>,
}

impl Entity {
    pub(crate) fn new(identity: EntityIdentity, engine: Arc<Resolver>) -> Self {
        Self {
            identity,
            engine,
            state: RwLock::new(EntityState {
                kind: EntityKind::Unknown,
                loaded: None,
                raw: AttrMap::new(),
                resolved: BTreeMap::new(),
            }),
        }
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    pub fn org(&self) -> &OrgId {
        &self.identity.org
    }

    pub fn frame_id(&self) -> &str {
        &self.identity.id
    }

    /// Record kind; `Unknown` until the first successful load.
    pub fn kind(&self) -> EntityKind {
        self.read_state().kind
    }

    /// Upstream browser URL for this record. Needs no fetch.
    pub fn url(&self) -> String {
        format!(
            "http://biocyc.org/{}/NEW-IMAGE?object={}",
            self.identity.org, self.identity.id
        )
    }

    /// Ensure base (non-relational) attributes are populated, going to
    /// the cache first and the throttled fetcher on a miss or expiry.
    /// Relational reference lists are loaded separately, on first access
    /// to a relational attribute.
    pub async fn ensure_loaded(&self) -> BiocycResult<()> {
        self.engine.ensure_raw(self, DetailLevel::Low).await
    }

    // ========================================================================
    // RAW (UNRESOLVED) ACCESS
    // ========================================================================

    /// Raw value of any schema attribute. Triggers at most one fetch (at
    /// the detail level the attribute needs); reference lists come back
    /// as frame-id strings and no referenced entity is constructed or
    /// resolved.
    pub async fn raw_attr(&self, attr: AttrName) -> BiocycResult<Option<AttrValue>> {
        let need = match attr.shape() {
            AttrShape::RefList => DetailLevel::Full,
            _ => DetailLevel::Low,
        };
        self.engine.ensure_raw(self, need).await?;
        self.check_applicable(attr)?;
        Ok(self.read_state().raw.get(&attr).cloned())
    }

    /// Unresolved frame-id view of a relational attribute. An attribute
    /// absent from a fully loaded record is the empty list.
    pub async fn raw_refs(&self, attr: AttrName) -> BiocycResult<Vec<FrameId>> {
        self.require_shape(attr, AttrShape::RefList)?;
        self.engine.ensure_raw(self, DetailLevel::Full).await?;
        self.check_applicable(attr)?;

        let state = self.read_state();
        match state.raw.get(&attr) {
            Some(AttrValue::RefList(ids)) => Ok(ids.clone()),
            Some(other) => Err(SchemaError::WrongShape {
                attr,
                expected: other.shape(),
                requested: AttrShape::RefList,
            }
            .into()),
            None => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // RESOLVED ACCESS
    // ========================================================================

    /// Resolve a relational attribute into entity references.
    ///
    /// Source order and multiplicity are preserved; no deduplication.
    /// Referenced identities stay in this entity's organism. The result
    /// is memoized: under a race the first stored sequence wins and every
    /// caller sees it.
    pub async fn refs(&self, attr: AttrName) -> BiocycResult<Vec<Arc<Entity>>> {
        self.require_shape(attr, AttrShape::RefList)?;

        if let Some(cached) = self.read_state().resolved.get(&attr) {
            return Ok(cached.clone());
        }

        let raw_ids = self.raw_refs(attr).await?;
        let entities: Vec<Arc<Entity>> = raw_ids
            .into_iter()
            .map(|id| Resolver::entity(&self.engine, self.identity.sibling(id)))
            .collect();

        let mut state = self.write_state();
        let stored = state.resolved.entry(attr).or_insert(entities);
        Ok(stored.clone())
    }

    // ========================================================================
    // SCALAR ACCESSORS
    // ========================================================================

    /// Common name, falling back to the last synonym when the record has
    /// no common name.
    pub async fn name(&self) -> BiocycResult<Option<String>> {
        self.ensure_loaded().await?;
        let state = self.read_state();
        if let Some(name) = state.raw.get(&AttrName::Name).and_then(|v| v.as_text()) {
            return Ok(Some(name.to_string()));
        }
        Ok(state
            .raw
            .get(&AttrName::Synonyms)
            .and_then(|v| v.as_text_list())
            .and_then(|list| list.last())
            .cloned())
    }

    pub async fn synonyms(&self) -> BiocycResult<Vec<String>> {
        Ok(self
            .raw_attr(AttrName::Synonyms)
            .await?
            .and_then(|v| v.as_text_list().map(<[String]>::to_vec))
            .unwrap_or_default())
    }

    pub async fn inchi(&self) -> BiocycResult<Option<String>> {
        Ok(self
            .raw_attr(AttrName::Inchi)
            .await?
            .and_then(|v| v.as_text().map(str::to_string)))
    }

    pub async fn molecular_weight(&self) -> BiocycResult<Option<f64>> {
        Ok(self
            .raw_attr(AttrName::MolecularWeight)
            .await?
            .and_then(|v| v.as_float()))
    }

    pub async fn gibbs0(&self) -> BiocycResult<Option<f64>> {
        Ok(self.raw_attr(AttrName::Gibbs0).await?.and_then(|v| v.as_float()))
    }

    /// Cross-reference map: external database name to identifier.
    pub async fn dblinks(&self) -> BiocycResult<BTreeMap<String, String>> {
        Ok(self
            .raw_attr(AttrName::DbLinks)
            .await?
            .and_then(|v| v.as_links().cloned())
            .unwrap_or_default())
    }

    /// Cross-references expanded into browse URLs where the external
    /// database is known; unknown databases keep the bare identifier.
    pub async fn dblink_urls(&self) -> BiocycResult<BTreeMap<String, String>> {
        let links = self.dblinks().await?;
        Ok(links
            .into_iter()
            .map(|(db, id)| {
                let value = dblink_url(&db, &id).unwrap_or(id);
                (db, value)
            })
            .collect())
    }

    // ========================================================================
    // RELATIONAL ACCESSORS
    // ========================================================================

    pub async fn parents(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::Parents).await
    }

    pub async fn instances(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::Instances).await
    }

    pub async fn pathways(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::Pathways).await
    }

    pub async fn super_pathways(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::SuperPathways).await
    }

    pub async fn species(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::Species).await
    }

    pub async fn taxonomic_range(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::TaxonomicRange).await
    }

    pub async fn reactions_left(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::ReactionsLeft).await
    }

    pub async fn reactions_right(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        self.refs(AttrName::ReactionsRight).await
    }

    /// All reactions a compound appears in: the right-side list followed
    /// by the left-side list, order and duplicates preserved.
    pub async fn reactions(&self) -> BiocycResult<Vec<Arc<Entity>>> {
        let mut all = self.reactions_right().await?;
        all.extend(self.reactions_left().await?);
        Ok(all)
    }

    /// Unresolved counterpart of [`reactions`](Self::reactions).
    pub async fn reaction_ids(&self) -> BiocycResult<Vec<FrameId>> {
        let mut all = self.raw_refs(AttrName::ReactionsRight).await?;
        all.extend(self.raw_refs(AttrName::ReactionsLeft).await?);
        Ok(all)
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    pub(crate) fn loaded_detail(&self) -> Option<DetailLevel> {
        self.read_state().loaded
    }

    /// Merge a cache record into the raw attribute mapping. Individual
    /// keys are replaced; the mapping is never replaced wholesale and
    /// memoized resolutions are untouched.
    pub(crate) fn merge_record(&self, record: CacheRecord) {
        let mut state = self.write_state();
        if record.kind != EntityKind::Unknown {
            state.kind = record.kind;
        }
        let detail = record.detail;
        for (attr, value) in record.attrs {
            state.raw.insert(attr, value);
        }
        state.loaded = Some(state.loaded.map_or(detail, |prev| prev.max(detail)));
    }

    fn check_applicable(&self, attr: AttrName) -> BiocycResult<()> {
        let kind = self.kind();
        if is_applicable(kind, attr) {
            Ok(())
        } else {
            Err(SchemaError::UnknownAttribute { kind, attr }.into())
        }
    }

    fn require_shape(&self, attr: AttrName, requested: AttrShape) -> BiocycResult<()> {
        if attr.shape() == requested {
            Ok(())
        } else {
            Err(SchemaError::WrongShape {
                attr,
                expected: attr.shape(),
                requested,
            }
            .into())
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, EntityState> {
        self.state.read().expect("entity lock poisoned")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, EntityState> {
        self.state.write().expect("entity lock poisoned")
    }
}

// The registry and resolved reference lists form cycles by design, so
// Debug prints identity and kind only.
impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("identity", &self.identity)
            .field("kind", &self.kind())
            .finish()
    }
}
