//! The ledger's record entities.
//!
//! Records are immutable once committed. Corrections are new records; the
//! only growth is appending to the keyed collections and the audit trail.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EntityId, Timestamp};

/// Fact kind under which bridge triples are materialized.
pub const BRIDGE_TRIPLE_KIND: &str = "bridge-triple";

/// Review status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate claim, inherently fuzzy until promoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Proposal {
    pub id: EntityId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<EntityId>,
    pub status: ProposalStatus,
    /// Producer confidence in `[0.0, 1.0]`.
    pub score: f64,
    /// How the proposal was produced, e.g. `"ann"`. Never blank.
    pub method: String,
    /// Supporting evidence pointers as supplied by the producer.
    pub evidence: Vec<serde_json::Value>,
    pub created_at: Timestamp,
}

/// An explicit reviewer decision to accept a proposal as a fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Promotion {
    pub id: EntityId,
    /// The proposal being promoted; must already be stored.
    pub proposal_id: EntityId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<EntityId>,
    pub decided_by: String,
    pub rationale: String,
    pub created_at: Timestamp,
}

/// What an evidence attachment points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetType {
    Proposal,
    Promotion,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Proposal => "proposal",
            TargetType::Promotion => "promotion",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed pointer from evidence to its subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EvidenceTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub id: EntityId,
}

/// A supporting attachment on a proposal or a promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Evidence {
    pub id: EntityId,
    pub target: EvidenceTarget,
    pub method: String,
    /// Arbitrary collection payload (array or map).
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// Reviewer or agent activity. Only `id`, `type`, and `created-at` are
/// guaranteed; consumers must not rely on `actor` or `note` being present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Action {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// A materialized decision outcome. The ledger records the decision only;
/// pushing the fact into an authoritative store happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Fact {
    pub id: EntityId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub created_at: Timestamp,
    /// The promotion that authorized this fact; must already be stored.
    pub promotion_id: EntityId,
}

/// A fact of kind `bridge-triple`, also kept in its own index so chain
/// steps can warrant sense-shifts against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BridgeTriple {
    pub id: EntityId,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proposal_roundtrip() {
        let proposal = Proposal {
            id: EntityId::new("p-1"),
            kind: "claim".to_string(),
            target_id: None,
            status: ProposalStatus::Pending,
            score: 0.42,
            method: "ann".to_string(),
            evidence: vec![],
            created_at: Timestamp::from_millis(1_704_067_200_000),
        };
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["created-at"], 1_704_067_200_000i64);
        assert!(value.get("target-id").is_none());
        let recovered: Proposal = serde_json::from_value(value).unwrap();
        assert_eq!(proposal, recovered);
    }

    #[test]
    fn test_evidence_target_uses_type_key() {
        let target = EvidenceTarget {
            target_type: TargetType::Promotion,
            id: EntityId::new("pr-1"),
        };
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value, json!({"type": "promotion", "id": "pr-1"}));
    }

    #[test]
    fn test_action_optional_fields() {
        let action: Action = serde_json::from_value(json!({
            "id": "act-1",
            "type": "triage",
            "created-at": 7,
        }))
        .unwrap();
        assert!(action.actor.is_none());
        assert!(action.note.is_none());
        assert_eq!(action.action_type, "triage");
    }

    #[test]
    fn test_fact_rejects_unknown_keys() {
        let result: Result<Fact, _> = serde_json::from_value(json!({
            "id": "f-1",
            "kind": "claim",
            "created-at": 7,
            "promotion-id": "pr-1",
            "surprise": true,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_bridge_triple_sparse() {
        let bridge: BridgeTriple = serde_json::from_value(json!({
            "id": "b-1",
            "created-at": 9,
            "subject": "bank",
            "object": "river-bank",
        }))
        .unwrap();
        assert_eq!(bridge.subject.as_deref(), Some("bank"));
        assert!(bridge.predicate.is_none());
        assert!(bridge.rationale.is_none());
    }
}
