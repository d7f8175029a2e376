//! Disk-backed record store with TTL and atomic replace.
//!
//! Layout: one JSON file per record at `<root>/<ORG>/<frame-id>.json`.
//! The directory may live on a network filesystem shared by several
//! machines; writes go to a temp file in the target directory and are
//! renamed into place so concurrent readers never observe a torn record.

use crate::record::CacheRecord;
use biocyc_core::{BiocycResult, CacheError, EntityIdentity};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Explicit three-way result of a cache read, so callers and tests can
/// assert on which path was taken.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A record exists and is within the TTL.
    Fresh(CacheRecord),
    /// A record exists but its age exceeds the TTL. The caller is
    /// expected to re-fetch and overwrite; the record is not deleted.
    Stale(CacheRecord),
    /// No readable record exists.
    Missing,
}

impl CacheLookup {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Persistent key/value store for fetched records, keyed by entity
/// identity.
///
/// The store is an optimization, never a source of truth: unreadable or
/// corrupt records are logged and reported as `Missing`, and a failed
/// write leaves the previous record intact.
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
    fallbacks: Vec<PathBuf>,
    ttl: RwLock<Duration>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            fallbacks: Vec::new(),
            ttl: RwLock::new(ttl),
        }
    }

    /// Add read-only fallback directories, consulted in order after the
    /// primary. Writes always go to the primary.
    pub fn with_fallbacks(mut self, paths: Vec<PathBuf>) -> Self {
        self.fallbacks = paths;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        *self.ttl.read().expect("ttl lock poisoned")
    }

    /// Change the TTL used by subsequent reads. Existing records are
    /// re-evaluated against the new value; nothing is rewritten.
    pub fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().expect("ttl lock poisoned") = ttl;
    }

    /// Look up a record. Searches the primary directory and then each
    /// fallback; the first fresh record wins. A stale record is reported
    /// only if no directory holds a fresh one.
    pub fn read(&self, identity: &EntityIdentity) -> CacheLookup {
        let ttl = self.ttl();
        let mut stale: Option<CacheRecord> = None;

        for base in std::iter::once(&self.root).chain(self.fallbacks.iter()) {
            let path = record_path(base, identity);
            let record = match read_record(&path) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%identity, error = %err, "unreadable cache record, treating as miss");
                    continue;
                }
            };

            if record.is_fresh(ttl) {
                debug!(%identity, path = %path.display(), "cache hit");
                return CacheLookup::Fresh(record);
            }
            if stale.is_none() {
                stale = Some(record);
            }
        }

        match stale {
            Some(record) => {
                debug!(%identity, "cache record expired");
                CacheLookup::Stale(record)
            }
            None => CacheLookup::Missing,
        }
    }

    /// Atomically create or replace the record for `identity` in the
    /// primary directory.
    pub fn write(&self, identity: &EntityIdentity, record: &CacheRecord) -> BiocycResult<()> {
        let dir = self.root.join(identity.org.as_str());
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;

        let path = record_path(&self.root, identity);
        let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, &e))?;
        serde_json::to_writer(tmp.as_file(), record).map_err(|e| CacheError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tmp.persist(&path).map_err(|e| io_error(&path, &e.error))?;

        debug!(%identity, path = %path.display(), "cache record written");
        Ok(())
    }

    /// Whether the primary directory holds any record (fresh or stale)
    /// for `identity`.
    pub fn contains(&self, identity: &EntityIdentity) -> bool {
        record_path(&self.root, identity).exists()
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn read_record(path: &Path) -> Result<Option<CacheRecord>, CacheError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(path, &err)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn record_path(base: &Path, identity: &EntityIdentity) -> PathBuf {
    base.join(identity.org.as_str())
        .join(format!("{}.json", encode_frame_id(&identity.id)))
}

/// Encode a frame id into a filename. Frame ids are almost always plain
/// `[A-Z0-9.+-]` but the upstream vocabulary is open; anything outside a
/// conservative set (including `%` itself) is percent-encoded so distinct
/// ids can never collide on disk.
fn encode_frame_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'+' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CacheRecord;
    use biocyc_core::{AttrName, AttrValue, DetailLevel, EntityKind, EntityPayload};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::io::Write as _;

    fn lactate() -> EntityIdentity {
        EntityIdentity::new("META", "L-LACTATE")
    }

    fn payload() -> EntityPayload {
        EntityPayload::new(EntityKind::Compound)
            .with_attr(AttrName::Name, AttrValue::Text("(S)-lactate".to_string()))
            .with_attr(
                AttrName::ReactionsLeft,
                AttrValue::RefList(vec!["RXN-9083".to_string(), "TRANS-RXN-104".to_string()]),
            )
    }

    #[test]
    fn test_missing_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(60));
        assert!(store.read(&lactate()).is_missing());
    }

    #[test]
    fn test_write_then_read_is_fresh_with_equal_attrs() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(60));

        let record = CacheRecord::new(payload(), DetailLevel::Full);
        store.write(&lactate(), &record).unwrap();

        match store.read(&lactate()) {
            CacheLookup::Fresh(read) => assert_eq!(read.attrs, record.attrs),
            other => panic!("expected Fresh, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_record_reads_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(3600));

        let old = CacheRecord::at(payload(), DetailLevel::Full, Utc::now() - chrono::Duration::hours(2));
        store.write(&lactate(), &old).unwrap();

        assert!(store.read(&lactate()).is_stale());
        // The record file survives expiry; only a successful re-fetch
        // overwrites it.
        assert!(store.contains(&lactate()));
    }

    #[test]
    fn test_ttl_change_applies_at_read_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(3600));

        let record = CacheRecord::at(payload(), DetailLevel::Full, Utc::now() - chrono::Duration::minutes(10));
        store.write(&lactate(), &record).unwrap();
        assert!(store.read(&lactate()).is_fresh());

        store.set_ttl(Duration::from_secs(60));
        assert!(store.read(&lactate()).is_stale());
    }

    #[test]
    fn test_corrupt_record_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(60));

        let org_dir = dir.path().join("META");
        fs::create_dir_all(&org_dir).unwrap();
        let mut f = fs::File::create(org_dir.join("L-LACTATE.json")).unwrap();
        f.write_all(b"{ not json").unwrap();

        assert!(store.read(&lactate()).is_missing());
    }

    #[test]
    fn test_overwrite_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(60));

        store.write(&lactate(), &CacheRecord::new(payload(), DetailLevel::Full)).unwrap();

        let updated = EntityPayload::new(EntityKind::Compound)
            .with_attr(AttrName::Name, AttrValue::Text("renamed".to_string()));
        store.write(&lactate(), &CacheRecord::new(updated, DetailLevel::Full)).unwrap();

        match store.read(&lactate()) {
            CacheLookup::Fresh(read) => {
                assert_eq!(
                    read.attrs.get(&AttrName::Name).and_then(|v| v.as_text()),
                    Some("renamed")
                );
                assert!(!read.attrs.contains_key(&AttrName::ReactionsLeft));
            }
            other => panic!("expected Fresh, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_directory_is_consulted() {
        let primary = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();

        // Seed the shared directory through its own store handle.
        let seeder = CacheStore::new(shared.path(), Duration::from_secs(60));
        seeder.write(&lactate(), &CacheRecord::new(payload(), DetailLevel::Full)).unwrap();

        let store = CacheStore::new(primary.path(), Duration::from_secs(60))
            .with_fallbacks(vec![shared.path().to_path_buf()]);

        assert!(store.read(&lactate()).is_fresh());
        // Reads from a fallback never copy into the primary.
        assert!(!store.contains(&lactate()));
    }

    #[test]
    fn test_fresh_primary_beats_fallback() {
        let primary = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();

        let store = CacheStore::new(primary.path(), Duration::from_secs(3600))
            .with_fallbacks(vec![shared.path().to_path_buf()]);
        let seeder = CacheStore::new(shared.path(), Duration::from_secs(3600));

        let newer = EntityPayload::new(EntityKind::Compound)
            .with_attr(AttrName::Name, AttrValue::Text("primary".to_string()));
        let older = EntityPayload::new(EntityKind::Compound)
            .with_attr(AttrName::Name, AttrValue::Text("fallback".to_string()));

        store.write(&lactate(), &CacheRecord::new(newer, DetailLevel::Full)).unwrap();
        seeder.write(&lactate(), &CacheRecord::new(older, DetailLevel::Full)).unwrap();

        match store.read(&lactate()) {
            CacheLookup::Fresh(read) => assert_eq!(
                read.attrs.get(&AttrName::Name).and_then(|v| v.as_text()),
                Some("primary")
            ),
            other => panic!("expected Fresh, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_fallback_when_primary_missing() {
        let primary = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();

        let seeder = CacheStore::new(shared.path(), Duration::from_secs(3600));
        let old = CacheRecord::at(payload(), DetailLevel::Full, Utc::now() - chrono::Duration::days(1));
        seeder.write(&lactate(), &old).unwrap();

        let store = CacheStore::new(primary.path(), Duration::from_secs(3600))
            .with_fallbacks(vec![shared.path().to_path_buf()]);
        assert!(store.read(&lactate()).is_stale());
    }

    #[test]
    fn test_frame_id_with_path_hostile_chars() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(60));

        let odd = EntityIdentity::new("META", "CPD/1:alpha glucose");
        store.write(&odd, &CacheRecord::new(payload(), DetailLevel::Full)).unwrap();
        assert!(store.read(&odd).is_fresh());
    }

    proptest! {
        #[test]
        fn prop_encoded_frame_id_has_no_separators(id in ".{1,40}") {
            let encoded = encode_frame_id(&id);
            prop_assert!(!encoded.contains('/'));
            prop_assert!(!encoded.contains('\\'));
            prop_assert!(!encoded.contains('\0'));
        }

        #[test]
        fn prop_encoding_is_injective(a in ".{1,20}", b in ".{1,20}") {
            if a != b {
                prop_assert_ne!(encode_frame_id(&a), encode_frame_id(&b));
            }
        }
    }
}
