//! BioCyc Core - Data Types and Boundary Traits
//!
//! Identity types, the attribute schema, the fetcher boundary, error
//! taxonomy, and configuration. All other crates depend on this. No I/O
//! lives here.

pub mod config;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod schema;

pub use config::{
    BiocycConfig, DetailLevel, RetryConfig, DEFAULT_MIN_FETCH_INTERVAL, DEFAULT_TTL,
};
pub use error::{BiocycError, BiocycResult, CacheError, ConfigError, FetchError, SchemaError};
pub use fetch::{AttrMap, EntityFetcher, EntityPayload};
pub use identity::{EntityIdentity, FrameId, OrgId, Timestamp};
pub use schema::{
    dblink_url, is_applicable, AttrName, AttrShape, AttrValue, EntityKind,
};
