//! Configuration types

use crate::error::{BiocycResult, ConfigError};
use crate::identity::OrgId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default record expiry: roughly six months.
pub const DEFAULT_TTL: Duration = Duration::from_secs(180 * 24 * 60 * 60);

/// Default minimum interval between outbound fetches.
pub const DEFAULT_MIN_FETCH_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_BASE_URL: &str = "https://websvc.biocyc.org";

/// How much of a record the remote service is asked to return. Levels
/// are ordered: a record fetched at `Full` satisfies any lower need.
///
/// Base (non-relational) attributes are available from `Low` upward;
/// relational reference lists only arrive at `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DetailLevel {
    None,
    #[default]
    Low,
    Full,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Full => "full",
        }
    }

    /// Parse a detail level; unknown values are a config error.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::InvalidValue {
                field: "detail".to_string(),
                value: other.to_string(),
                reason: "expected one of none, low, full".to_string(),
            }),
        }
    }
}

/// Retry policy for transient fetch failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (zero-based), capped at
    /// `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let backoff = self.initial_backoff.mul_f64(factor.max(0.0));
        backoff.min(self.max_backoff)
    }
}

/// Client configuration.
///
/// Everything has a default mirroring the public BioCyc service; builders
/// override individual fields and `validate()` runs before any context is
/// constructed from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiocycConfig {
    /// Primary cache directory. Records are written here.
    pub cache_dir: PathBuf,
    /// Read-only fallback cache directories, consulted in order after the
    /// primary misses. Useful for caches shared over a network filesystem.
    pub extra_cache_paths: Vec<PathBuf>,
    /// Record expiry. A stale record forces a re-fetch on next access.
    pub ttl: Duration,
    /// Minimum interval between the starts of outbound fetches.
    pub min_fetch_interval: Duration,
    /// Base URL of the remote service.
    pub base_url: String,
    /// Detail level requested when a root lookup populates base
    /// attributes. Relational attribute loads always fetch the full
    /// record regardless of this setting; raising it to `Full` makes
    /// root lookups prefetch reference lists in the same request.
    pub detail: DetailLevel,
    /// Organism used for top-level `get` calls.
    pub default_organism: OrgId,
    /// Retry policy for transient fetch failures.
    pub retry: RetryConfig,
}

impl Default for BiocycConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            cache_dir: home.join(".biocyc"),
            extra_cache_paths: Vec::new(),
            ttl: DEFAULT_TTL,
            min_fetch_interval: DEFAULT_MIN_FETCH_INTERVAL,
            base_url: DEFAULT_BASE_URL.to_string(),
            detail: DetailLevel::Low,
            default_organism: OrgId::new("HUMAN"),
            retry: RetryConfig::default(),
        }
    }
}

impl BiocycConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_extra_cache_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_cache_paths.push(dir.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_min_fetch_interval(mut self, interval: Duration) -> Self {
        self.min_fetch_interval = interval;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_detail(mut self, detail: DetailLevel) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_organism(mut self, org: impl Into<OrgId>) -> Self {
        self.default_organism = org.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - ttl is positive
    /// - base_url is non-empty
    /// - default_organism is non-empty
    /// - backoff_multiplier is positive
    pub fn validate(&self) -> BiocycResult<()> {
        if self.ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ttl".to_string(),
                value: format!("{:?}", self.ttl),
                reason: "ttl must be positive".to_string(),
            }
            .into());
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                reason: "base_url must be non-empty".to_string(),
            }
            .into());
        }

        if self.default_organism.as_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_organism".to_string(),
                value: String::new(),
                reason: "default_organism must be non-empty".to_string(),
            }
            .into());
        }

        if self.retry.backoff_multiplier <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.backoff_multiplier".to_string(),
                value: self.retry.backoff_multiplier.to_string(),
                reason: "backoff_multiplier must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `BIOCYC_CACHE_DIR`: primary cache directory
    /// - `BIOCYC_TTL_DAYS`: record expiry in days
    /// - `BIOCYC_MIN_FETCH_INTERVAL_MS`: fetch throttle interval in milliseconds
    /// - `BIOCYC_BASE_URL`: remote service base URL
    /// - `BIOCYC_ORGANISM`: default organism id
    /// - `BIOCYC_DETAIL`: one of none, low, full
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttl = std::env::var("BIOCYC_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|days| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or(defaults.ttl);

        let min_fetch_interval = std::env::var("BIOCYC_MIN_FETCH_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.min_fetch_interval);

        Self {
            cache_dir: std::env::var("BIOCYC_CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            ttl,
            min_fetch_interval,
            base_url: std::env::var("BIOCYC_BASE_URL")
                .ok()
                .unwrap_or(defaults.base_url),
            default_organism: std::env::var("BIOCYC_ORGANISM")
                .ok()
                .map(OrgId::new)
                .unwrap_or(defaults.default_organism),
            detail: std::env::var("BIOCYC_DETAIL")
                .ok()
                .and_then(|s| DetailLevel::parse(&s).ok())
                .unwrap_or(defaults.detail),
            ..defaults
        }
    }
}
