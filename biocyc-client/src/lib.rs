//! BioCyc Client - Cached Lazy Entity Resolution
//!
//! Rate-limited remote pathway/genome databases are slow to query and
//! their records reference each other cyclically. This crate keeps one
//! canonical in-memory instance per record identity, backs every fetch
//! with a shared on-disk cache and a process-wide throttle, and resolves
//! relational attributes lazily so navigating the reference graph never
//! fans out into eager fetching.

pub mod context;
pub mod entity;
pub mod http;
pub mod registry;
mod resolver;
pub mod throttle;

pub use context::BioCyc;
pub use entity::Entity;
pub use http::HttpFetcher;
pub use registry::EntityRegistry;
pub use throttle::Throttle;

// Re-export the vocabulary types callers need alongside the context.
pub use biocyc_cache::{CacheLookup, CacheRecord, CacheStore};
pub use biocyc_core::{
    AttrName, AttrShape, AttrValue, BiocycConfig, BiocycError, BiocycResult, DetailLevel,
    EntityFetcher, EntityIdentity, EntityKind, EntityPayload, FetchError, FrameId, OrgId,
    RetryConfig, SchemaError,
};
