//! On-disk cache record format.

use biocyc_core::{AttrMap, DetailLevel, EntityKind, EntityPayload, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached record: the raw attribute mapping, the detail level it was
/// fetched at, and the time it was fetched. Freshness is evaluated
/// against a TTL at read time, never stored.
///
/// The detail level matters to readers: a record fetched at `Low` holds
/// base attributes only, so a caller needing reference lists must treat
/// it like a miss even while it is fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub kind: EntityKind,
    pub attrs: AttrMap,
    pub detail: DetailLevel,
    pub fetched_at: Timestamp,
}

impl CacheRecord {
    /// Record a payload fetched just now.
    pub fn new(payload: EntityPayload, detail: DetailLevel) -> Self {
        Self::at(payload, detail, Utc::now())
    }

    /// Record a payload with an explicit fetch time. Tests use this to
    /// construct already-expired records.
    pub fn at(payload: EntityPayload, detail: DetailLevel, fetched_at: Timestamp) -> Self {
        Self {
            kind: payload.kind,
            attrs: payload.attrs,
            detail,
            fetched_at,
        }
    }

    /// Age of the record. Clock skew (a `fetched_at` in the future) reads
    /// as zero age rather than an error.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// Whether this record can serve a read needing `need` detail.
    pub fn satisfies(&self, need: DetailLevel) -> bool {
        self.detail >= need
    }

    pub fn into_payload(self) -> EntityPayload {
        EntityPayload {
            kind: self.kind,
            attrs: self.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biocyc_core::{AttrName, AttrValue};

    fn payload() -> EntityPayload {
        EntityPayload::new(EntityKind::Compound)
            .with_attr(AttrName::Name, AttrValue::Text("(S)-lactate".to_string()))
    }

    #[test]
    fn test_new_record_is_fresh() {
        let record = CacheRecord::new(payload(), DetailLevel::Full);
        assert!(record.is_fresh(Duration::from_secs(60)));
        assert!(record.age() < Duration::from_secs(5));
    }

    #[test]
    fn test_old_record_is_stale() {
        let fetched_at = Utc::now() - chrono::Duration::days(200);
        let record = CacheRecord::at(payload(), DetailLevel::Full, fetched_at);
        assert!(!record.is_fresh(Duration::from_secs(180 * 24 * 60 * 60)));
        assert!(record.is_fresh(Duration::from_secs(400 * 24 * 60 * 60)));
    }

    #[test]
    fn test_future_timestamp_reads_as_zero_age() {
        let fetched_at = Utc::now() + chrono::Duration::hours(1);
        let record = CacheRecord::at(payload(), DetailLevel::Full, fetched_at);
        assert_eq!(record.age(), Duration::ZERO);
        assert!(record.is_fresh(Duration::from_secs(1)));
    }

    #[test]
    fn test_detail_satisfaction() {
        let low = CacheRecord::new(payload(), DetailLevel::Low);
        assert!(low.satisfies(DetailLevel::None));
        assert!(low.satisfies(DetailLevel::Low));
        assert!(!low.satisfies(DetailLevel::Full));

        let full = CacheRecord::new(payload(), DetailLevel::Full);
        assert!(full.satisfies(DetailLevel::Full));
    }

    #[test]
    fn test_into_payload_preserves_attrs() {
        let record = CacheRecord::new(payload(), DetailLevel::Full);
        let restored = record.into_payload();
        assert_eq!(restored, payload());
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = CacheRecord::new(payload(), DetailLevel::Low);
        let json = serde_json::to_string(&record).unwrap();
        let back: CacheRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
