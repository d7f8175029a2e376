//! Fetcher boundary between the resolution engine and the remote service.
//!
//! The engine only ever sees an [`EntityFetcher`]: one throttled network
//! operation producing an attribute payload. Transport and body format
//! belong to the implementation behind the trait.

use crate::config::DetailLevel;
use crate::error::FetchError;
use crate::identity::EntityIdentity;
use crate::schema::{AttrName, AttrValue, EntityKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw attribute mapping produced by one fetch.
pub type AttrMap = BTreeMap<AttrName, AttrValue>;

/// The parsed result of fetching one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPayload {
    pub kind: EntityKind,
    pub attrs: AttrMap,
}

impl EntityPayload {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            attrs: AttrMap::new(),
        }
    }

    /// Builder used by fixtures and payload converters.
    pub fn with_attr(mut self, attr: AttrName, value: AttrValue) -> Self {
        self.attrs.insert(attr, value);
        self
    }

    pub fn get(&self, attr: AttrName) -> Option<&AttrValue> {
        self.attrs.get(&attr)
    }
}

/// One network request for one `(organism, frame)` identity.
///
/// Implementations must be `Send + Sync`; the engine shares one fetcher
/// across all entities. Callers acquire the context throttle before
/// every invocation, including retries.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// Fetch the full record for `identity` at the given detail level.
    ///
    /// # Returns
    /// * `Ok(EntityPayload)` - parsed kind and attributes
    /// * `Err(FetchError::NotFound)` - the identity does not exist upstream
    /// * `Err(FetchError::Transient)` - retryable transport/service failure
    /// * `Err(FetchError::InvalidPayload)` - body could not be understood
    async fn fetch(
        &self,
        identity: &EntityIdentity,
        detail: DetailLevel,
    ) -> Result<EntityPayload, FetchError>;
}
