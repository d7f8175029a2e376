//! HTTP fetcher for the BioCyc web service.

use async_trait::async_trait;
use biocyc_core::{
    AttrName, AttrShape, AttrValue, BiocycResult, ConfigError, DetailLevel, EntityFetcher,
    EntityIdentity, EntityKind, EntityPayload, FetchError,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher backed by the remote JSON web service.
///
/// One GET per record: `{base}/get?org={ORG}&id={ID}&detail={LEVEL}`.
/// The caller owns throttling and retries; this type only maps one
/// request to one payload or error.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> BiocycResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("biocyc-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "http_client".to_string(),
                value: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EntityFetcher for HttpFetcher {
    async fn fetch(
        &self,
        identity: &EntityIdentity,
        detail: DetailLevel,
    ) -> Result<EntityPayload, FetchError> {
        let url = format!("{}/get", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("org", identity.org.as_str()),
                ("id", identity.id.as_str()),
                ("detail", detail.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transient {
                reason: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                org: identity.org.clone(),
                id: identity.id.clone(),
            });
        }
        if !status.is_success() {
            // 429 and 5xx are the expected shapes here; anything else odd
            // from the service is treated the same way and left to the
            // caller's capped retry.
            return Err(FetchError::Transient {
                reason: format!("service returned {}", status),
            });
        }

        let wire: WireRecord = response.json().await.map_err(|e| FetchError::InvalidPayload {
            reason: format!("undecodable body: {}", e),
        })?;

        Ok(payload_from_wire(identity, wire))
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireRecord {
    class: String,
    #[serde(default)]
    slots: BTreeMap<String, WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Links(BTreeMap<String, String>),
}

/// Convert a wire record into a payload, keeping only the slots the
/// schema knows about. A slot whose value cannot be coerced to its
/// declared shape is skipped with a warning; the record itself is never
/// rejected for one bad slot.
fn payload_from_wire(identity: &EntityIdentity, wire: WireRecord) -> EntityPayload {
    let kind = EntityKind::from_schema_class(&wire.class);
    let mut payload = EntityPayload::new(kind);

    for (slot, value) in wire.slots {
        let Some(attr) = AttrName::from_wire_name(&slot) else {
            continue;
        };
        match coerce(attr.shape(), value) {
            Some(coerced) => {
                payload.attrs.insert(attr, coerced);
            }
            None => {
                warn!(%identity, %attr, "slot value does not match declared shape, skipping");
            }
        }
    }

    payload
}

fn coerce(shape: AttrShape, value: WireValue) -> Option<AttrValue> {
    match (shape, value) {
        (AttrShape::Text, WireValue::Text(s)) => Some(AttrValue::Text(s)),
        (AttrShape::Float, WireValue::Number(n)) => Some(AttrValue::Float(n)),
        // Numeric slots arrive as strings at some detail levels.
        (AttrShape::Float, WireValue::Text(s)) => s.parse().ok().map(AttrValue::Float),
        (AttrShape::TextList, WireValue::List(v)) => Some(AttrValue::TextList(v)),
        (AttrShape::TextList, WireValue::Text(s)) => Some(AttrValue::TextList(vec![s])),
        (AttrShape::RefList, WireValue::List(v)) => Some(AttrValue::RefList(v)),
        (AttrShape::RefList, WireValue::Text(s)) => Some(AttrValue::RefList(vec![s])),
        (AttrShape::Links, WireValue::Links(m)) => Some(AttrValue::Links(m)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lactate() -> EntityIdentity {
        EntityIdentity::new("META", "L-LACTATE")
    }

    fn wire(value: serde_json::Value) -> WireRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_compound_payload_conversion() {
        let record = wire(json!({
            "class": "Compound",
            "slots": {
                "common-name": "(S)-lactate",
                "synonym": ["L-lactate", "(S)-2-hydroxypropanoate"],
                "molecular-weight": 89.07,
                "inchi": "InChI=1S/C3H6O3/c1-2(4)3(5)6/h2,4H,1H3,(H,5,6)/t2-/m0/s1",
                "appears-in-left-side-of": ["RXN-9083"],
                "appears-in-right-side-of": ["TRANS-RXN-104", "RXN-9083"],
                "dblink": {"CHEBI": "422", "KEGG": "C00186"}
            }
        }));

        let payload = payload_from_wire(&lactate(), record);
        assert_eq!(payload.kind, EntityKind::Compound);
        assert_eq!(
            payload.get(AttrName::Name).and_then(|v| v.as_text()),
            Some("(S)-lactate")
        );
        assert_eq!(
            payload.get(AttrName::MolecularWeight).and_then(|v| v.as_float()),
            Some(89.07)
        );
        assert_eq!(
            payload.get(AttrName::ReactionsRight).and_then(|v| v.as_ref_list()),
            Some(&["TRANS-RXN-104".to_string(), "RXN-9083".to_string()][..])
        );
        assert_eq!(
            payload
                .get(AttrName::DbLinks)
                .and_then(|v| v.as_links())
                .and_then(|m| m.get("CHEBI"))
                .map(String::as_str),
            Some("422")
        );
    }

    #[test]
    fn test_unknown_slots_are_skipped() {
        let record = wire(json!({
            "class": "Compound",
            "slots": {
                "common-name": "pyruvate",
                "smiles": "CC(=O)C(=O)O"
            }
        }));

        let payload = payload_from_wire(&lactate(), record);
        assert_eq!(payload.attrs.len(), 1);
    }

    #[test]
    fn test_numeric_string_coerces_to_float() {
        let record = wire(json!({
            "class": "Compound",
            "slots": {"molecular-weight": "90.08"}
        }));

        let payload = payload_from_wire(&lactate(), record);
        assert_eq!(
            payload.get(AttrName::MolecularWeight).and_then(|v| v.as_float()),
            Some(90.08)
        );
    }

    #[test]
    fn test_single_ref_promotes_to_list() {
        let record = wire(json!({
            "class": "Reaction",
            "slots": {"in-pathway": "PWY-5481"}
        }));

        let payload = payload_from_wire(&lactate(), record);
        assert_eq!(
            payload.get(AttrName::Pathways).and_then(|v| v.as_ref_list()),
            Some(&["PWY-5481".to_string()][..])
        );
    }

    #[test]
    fn test_shape_mismatch_drops_slot_only() {
        let record = wire(json!({
            "class": "Compound",
            "slots": {
                "common-name": "pyruvate",
                "molecular-weight": {"unexpected": "object"}
            }
        }));

        let payload = payload_from_wire(&lactate(), record);
        assert!(payload.get(AttrName::Name).is_some());
        assert!(payload.get(AttrName::MolecularWeight).is_none());
    }

    #[test]
    fn test_unknown_class_maps_to_unknown_kind() {
        let record = wire(json!({"class": "Promoter", "slots": {}}));
        let payload = payload_from_wire(&lactate(), record);
        assert_eq!(payload.kind, EntityKind::Unknown);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let fetcher = HttpFetcher::new("https://example.org/api/").unwrap();
        assert_eq!(fetcher.base_url(), "https://example.org/api");
    }
}
