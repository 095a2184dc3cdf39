//! The event envelope: every write attempt travels as one of these.
//!
//! The store builds envelopes itself (fresh event id, wall-clock `at`) around
//! the caller's payload map. Envelopes decoded from serialized form reject
//! unknown keys rather than silently dropping them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DecodeError;
use crate::types::{EntityId, Timestamp};

/// The recognized event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    ProposalRecorded,
    PromotionRecorded,
    EvidenceAttached,
    ActionRecorded,
    FactMaterialized,
    ChainBuilt,
}

impl EventType {
    /// The kebab-case tag used on the wire and in the audit file.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProposalRecorded => "proposal-recorded",
            EventType::PromotionRecorded => "promotion-recorded",
            EventType::EvidenceAttached => "evidence-attached",
            EventType::ActionRecorded => "action-recorded",
            EventType::FactMaterialized => "fact-materialized",
            EventType::ChainBuilt => "chain-built",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted write attempt: tag, fresh event id, wall instant, payload.
///
/// The payload stays a raw JSON map here; the validator inspects its shape
/// and the store decodes it into a typed entity only after a full pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub id: EntityId,
    pub at: Timestamp,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(
        event_type: EventType,
        id: EntityId,
        at: Timestamp,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            id,
            at,
            payload,
        }
    }

    /// Decode the payload into its typed entity.
    ///
    /// Only meaningful after validation has passed; a failure here means the
    /// validator and the typed model disagree.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_tags() {
        assert_eq!(EventType::ProposalRecorded.as_str(), "proposal-recorded");
        assert_eq!(EventType::ChainBuilt.as_str(), "chain-built");
        assert_eq!(
            serde_json::to_string(&EventType::EvidenceAttached).unwrap(),
            "\"evidence-attached\""
        );
    }

    #[test]
    fn test_event_roundtrip() {
        let event = Event::new(
            EventType::ActionRecorded,
            EntityId::new("evt-00000001"),
            Timestamp::from_millis(1_704_067_200_000),
            json!({"id": "act-1", "type": "review", "created-at": 1_704_067_200_000i64}),
        );
        let line = serde_json::to_string(&event).unwrap();
        let recovered: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(event, recovered);
    }

    #[test]
    fn test_event_rejects_unknown_envelope_keys() {
        let raw = json!({
            "type": "action-recorded",
            "id": "evt-00000001",
            "at": 1,
            "payload": {},
            "extra": true,
        });
        let result: Result<Event, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }
}
