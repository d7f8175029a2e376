//! BioCyc Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - A scriptable mock fetcher with call counting
//! - Canned payload fixtures for common scenarios

// Re-export core types for convenience
pub use biocyc_core::{
    AttrMap, AttrName, AttrShape, AttrValue, BiocycConfig, BiocycError, BiocycResult,
    DetailLevel, EntityFetcher, EntityIdentity, EntityKind, EntityPayload, FetchError, FrameId,
    OrgId,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

// ============================================================================
// MOCK FETCHER
// ============================================================================

/// Scriptable in-memory fetcher.
///
/// Identities without a scripted payload return `NotFound`. Transient
/// failures can be injected per identity and are consumed one per fetch.
/// Every call is counted and its start time recorded (tokio time, so it
/// cooperates with paused-clock tests).
///
/// Detail levels behave like the real service: a fetch below `Full`
/// strips relational reference lists from the scripted payload.
#[derive(Debug, Default)]
pub struct MockFetcher {
    payloads: Mutex<HashMap<EntityIdentity, EntityPayload>>,
    transient: Mutex<HashMap<EntityIdentity, u32>>,
    calls: AtomicUsize,
    starts: Mutex<Vec<(EntityIdentity, Instant)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fetcher preloaded with `(identity, payload)` pairs.
    pub fn with_payloads(
        payloads: impl IntoIterator<Item = (EntityIdentity, EntityPayload)>,
    ) -> Self {
        let fetcher = Self::new();
        for (identity, payload) in payloads {
            fetcher.insert(identity, payload);
        }
        fetcher
    }

    /// Script the payload returned for `identity`.
    pub fn insert(&self, identity: EntityIdentity, payload: EntityPayload) {
        self.payloads
            .lock()
            .unwrap()
            .insert(identity, payload);
    }

    /// Make the next `times` fetches of `identity` fail transiently
    /// before the scripted payload (or `NotFound`) applies.
    pub fn fail_transient(&self, identity: EntityIdentity, times: u32) {
        self.transient.lock().unwrap().insert(identity, times);
    }

    /// Total number of fetch calls, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Start times of every fetch call in invocation order.
    pub fn fetch_starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    /// Identities fetched, in invocation order.
    pub fn fetched_identities(&self) -> Vec<EntityIdentity> {
        self.starts.lock().unwrap().iter().map(|(i, _)| i.clone()).collect()
    }
}

#[async_trait]
impl EntityFetcher for MockFetcher {
    async fn fetch(
        &self,
        identity: &EntityIdentity,
        detail: DetailLevel,
    ) -> Result<EntityPayload, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.starts
            .lock()
            .unwrap()
            .push((identity.clone(), Instant::now()));

        if let Some(remaining) = self.transient.lock().unwrap().get_mut(identity) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FetchError::Transient {
                    reason: "injected failure".to_string(),
                });
            }
        }

        let mut payload = self
            .payloads
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                org: identity.org.clone(),
                id: identity.id.clone(),
            })?;

        if detail < DetailLevel::Full {
            payload.attrs.retain(|attr, _| attr.shape() != AttrShape::RefList);
        }
        Ok(payload)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

fn refs(ids: &[&str]) -> AttrValue {
    AttrValue::RefList(ids.iter().map(|s| s.to_string()).collect())
}

/// The `L-LACTATE` neighborhood in `META`: a compound appearing in two
/// reactions, one of which sits in a pathway with an organism reference.
pub fn lactate_graph() -> Vec<(EntityIdentity, EntityPayload)> {
    let lactate = EntityIdentity::new("META", "L-LACTATE");

    vec![
        (
            lactate.clone(),
            EntityPayload::new(EntityKind::Compound)
                .with_attr(AttrName::Name, AttrValue::Text("(S)-lactate".to_string()))
                .with_attr(
                    AttrName::Synonyms,
                    AttrValue::TextList(vec!["L-lactate".to_string()]),
                )
                .with_attr(AttrName::MolecularWeight, AttrValue::Float(89.07))
                .with_attr(
                    AttrName::DbLinks,
                    AttrValue::Links(
                        [
                            ("CHEBI".to_string(), "422".to_string()),
                            ("SOME-DB".to_string(), "X99".to_string()),
                        ]
                        .into_iter()
                        .collect(),
                    ),
                )
                .with_attr(AttrName::ReactionsLeft, refs(&["RXN-9083"]))
                .with_attr(AttrName::ReactionsRight, refs(&["TRANS-RXN-104"])),
        ),
        (
            lactate.sibling("RXN-9083"),
            EntityPayload::new(EntityKind::Reaction)
                .with_attr(AttrName::Pathways, refs(&["PWY-5481"])),
        ),
        (
            lactate.sibling("TRANS-RXN-104"),
            EntityPayload::new(EntityKind::Reaction),
        ),
        (
            lactate.sibling("PWY-5481"),
            EntityPayload::new(EntityKind::Pathway)
                .with_attr(
                    AttrName::Name,
                    AttrValue::Text("pyruvate fermentation to lactate".to_string()),
                )
                .with_attr(AttrName::Species, refs(&["ORG-6"])),
        ),
        (
            lactate.sibling("ORG-6"),
            EntityPayload::new(EntityKind::Organism)
                .with_attr(AttrName::Name, AttrValue::Text("Escherichia coli".to_string())),
        ),
    ]
}

/// Two pathways whose super-pathway lists point at each other, for
/// cyclic-resolution tests.
pub fn pathway_cycle(org: &str) -> Vec<(EntityIdentity, EntityPayload)> {
    let a = EntityIdentity::new(org, "PWY-A");
    let b = a.sibling("PWY-B");

    vec![
        (
            a,
            EntityPayload::new(EntityKind::Pathway)
                .with_attr(AttrName::SuperPathways, refs(&["PWY-B"])),
        ),
        (
            b,
            EntityPayload::new(EntityKind::Pathway)
                .with_attr(AttrName::SuperPathways, refs(&["PWY-A"])),
        ),
    ]
}
