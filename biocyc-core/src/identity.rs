//! Identity types for BioCyc entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Frame identifier of a single record within an organism database,
/// e.g. `L-LACTATE` or `TRANS-RXN-104`. Frame ids are opaque upstream
/// strings and are never generated locally.
pub type FrameId = String;

/// Organism database identifier (`META`, `HUMAN`, `ECOLI`, ...).
///
/// Normalized to uppercase on construction; the upstream service treats
/// organism ids case-insensitively but the cache layout and identity map
/// must not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(org: impl AsRef<str>) -> Self {
        Self(org.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(org: &str) -> Self {
        Self::new(org)
    }
}

impl From<String> for OrgId {
    fn from(org: String) -> Self {
        Self::new(org)
    }
}

/// Process-wide identity of one database record: the `(organism, frame)`
/// pair. Equality and hashing are defined solely on this pair.
///
/// For any identity at most one live `Entity` instance exists per
/// process; the registry enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityIdentity {
    pub org: OrgId,
    pub id: FrameId,
}

impl EntityIdentity {
    pub fn new(org: impl Into<OrgId>, id: impl Into<FrameId>) -> Self {
        Self {
            org: org.into(),
            id: id.into(),
        }
    }

    /// Identity of a record referenced from this one. References always
    /// stay within the referencing record's organism, never the context
    /// default.
    pub fn sibling(&self, id: impl Into<FrameId>) -> Self {
        Self {
            org: self.org.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.org, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_id_uppercases() {
        assert_eq!(OrgId::new("meta").as_str(), "META");
        assert_eq!(OrgId::new(" ecoli ").as_str(), "ECOLI");
        assert_eq!(OrgId::new("HUMAN"), OrgId::new("human"));
    }

    #[test]
    fn test_identity_equality_on_pair() {
        let a = EntityIdentity::new("META", "L-LACTATE");
        let b = EntityIdentity::new("meta", "L-LACTATE");
        let c = EntityIdentity::new("META", "PYRUVATE");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sibling_keeps_organism() {
        let lactate = EntityIdentity::new("META", "L-LACTATE");
        let rxn = lactate.sibling("RXN-9083");
        assert_eq!(rxn.org, OrgId::new("META"));
        assert_eq!(rxn.id, "RXN-9083");
    }

    #[test]
    fn test_identity_display() {
        let id = EntityIdentity::new("META", "L-LACTATE");
        assert_eq!(id.to_string(), "META:L-LACTATE");
    }

    proptest::proptest! {
        #[test]
        fn prop_org_id_normalization_is_idempotent(s in "[A-Za-z0-9-]{1,12}") {
            let once = OrgId::new(&s);
            let twice = OrgId::new(once.as_str());
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
