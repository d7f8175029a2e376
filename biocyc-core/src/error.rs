//! Error types for BioCyc client operations

use crate::identity::{FrameId, OrgId};
use crate::schema::{AttrName, AttrShape, EntityKind};
use std::path::PathBuf;
use thiserror::Error;

/// Network boundary errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// The identifier does not exist for that organism. Permanent for the
    /// identity; never retried.
    #[error("Object not found: {org}:{id}")]
    NotFound { org: OrgId, id: FrameId },

    /// Upstream unreachable, timed out, or over capacity. Retryable.
    #[error("Transient fetch failure: {reason}")]
    Transient { reason: String },

    /// The body came back but could not be understood. Not retried.
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

/// Cache store errors. These never cross the resolution boundary: the
/// read path downgrades both variants to a cache miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache I/O failed at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Corrupt cache record at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Attribute schema errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Attribute {attr} is not part of the {kind} schema")]
    UnknownAttribute { kind: EntityKind, attr: AttrName },

    #[error("Attribute {attr} has shape {expected:?}, requested as {requested:?}")]
    WrongShape {
        attr: AttrName,
        expected: AttrShape,
        requested: AttrShape,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all BioCyc client errors.
#[derive(Debug, Clone, Error)]
pub enum BiocycError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl BiocycError {
    /// True when the error is a permanent not-found for an identity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::NotFound { .. }))
    }
}

/// Result type alias for BioCyc client operations.
pub type BiocycResult<T> = Result<T, BiocycError>;

// =============================================================================
// TESTS
// =============================================================================
