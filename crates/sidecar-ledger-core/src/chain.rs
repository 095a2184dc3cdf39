//! Chains: ordered hops that justify a derived claim.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EntityId, Timestamp};

/// The closed set of hop variants. `build_chain` matches exhaustively, so a
/// new variant cannot be added without deciding its weight and cross-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    /// Typed edge in an external structure; not cross-checked here.
    Arrow,
    /// A stored bridge triple.
    Bridge,
    /// A stored (still fuzzy) proposal.
    Proposal,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Arrow => "arrow",
            StepType::Bridge => "bridge",
            StepType::Proposal => "proposal",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warrant for a sense-shift hop. Required when `shift` is set; advisory
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftGate {
    TypedArrow,
    BridgeTriple,
}

impl ShiftGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftGate::TypedArrow => "typed-arrow",
            ShiftGate::BridgeTriple => "bridge-triple",
        }
    }
}

impl fmt::Display for ShiftGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hop in a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ChainStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub target_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<ShiftGate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChainStep {
    /// Whether this hop crosses a sense boundary and therefore needs a gate.
    pub fn is_shift(&self) -> bool {
        self.shift.unwrap_or(false)
    }
}

/// A committed chain: the submitted steps merged with their softness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Chain {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub steps: Vec<ChainStep>,
    pub softness_total: f64,
    pub softness_average: f64,
    pub softness_per_step: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_type_tags() {
        assert_eq!(StepType::Arrow.as_str(), "arrow");
        assert_eq!(
            serde_json::to_string(&StepType::Proposal).unwrap(),
            "\"proposal\""
        );
    }

    #[test]
    fn test_step_deserializes_kebab_keys() {
        let step: ChainStep = serde_json::from_value(json!({
            "type": "bridge",
            "target-id": "b-1",
            "shift": true,
            "gate": "typed-arrow",
        }))
        .unwrap();
        assert_eq!(step.step_type, StepType::Bridge);
        assert!(step.is_shift());
        assert_eq!(step.gate, Some(ShiftGate::TypedArrow));
    }

    #[test]
    fn test_step_shift_defaults_off() {
        let step: ChainStep = serde_json::from_value(json!({
            "type": "arrow",
            "target-id": "a-1",
        }))
        .unwrap();
        assert!(!step.is_shift());
        assert!(step.gate.is_none());
    }

    #[test]
    fn test_chain_serializes_softness_fields() {
        let chain = Chain {
            id: EntityId::new("c-1"),
            created_at: Timestamp::from_millis(3),
            steps: vec![ChainStep {
                step_type: StepType::Proposal,
                target_id: EntityId::new("p-2"),
                shift: None,
                gate: None,
                notes: None,
            }],
            softness_total: 1.0,
            softness_average: 1.0,
            softness_per_step: vec![1.0],
        };
        let value = serde_json::to_value(&chain).unwrap();
        assert_eq!(value["softness-total"], 1.0);
        assert_eq!(value["softness-per-step"], json!([1.0]));
    }
}
