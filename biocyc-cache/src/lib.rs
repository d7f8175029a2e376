//! BioCyc Cache - Persistent Record Store
//!
//! Disk-backed cache for fetched records with time-based expiry and
//! atomic replacement, safe to share across processes and machines.

pub mod record;
pub mod store;

pub use record::CacheRecord;
pub use store::{CacheLookup, CacheStore};
