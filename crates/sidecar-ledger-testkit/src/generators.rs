//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

use sidecar_ledger_core::StepType;

use crate::fixtures::FIXTURE_EPOCH_MS;

/// Generate a short kebab-ish identifier.
pub fn entity_id(prefix: &'static str) -> impl Strategy<Value = String> {
    "[a-f0-9]{8}".prop_map(move |tail| format!("{prefix}-{tail}"))
}

/// Generate an in-range proposal score.
pub fn score() -> impl Strategy<Value = f64> {
    0.0f64..=1.0f64
}

/// Generate a proposal status tag.
pub fn status() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("pending"), Just("accepted"), Just("rejected")]
}

/// Generate a reasonable created-at instant.
pub fn created_at() -> impl Strategy<Value = i64> {
    FIXTURE_EPOCH_MS..FIXTURE_EPOCH_MS + 365 * 24 * 3_600 * 1_000
}

/// Generate a step type.
pub fn step_type() -> impl Strategy<Value = StepType> {
    prop_oneof![
        Just(StepType::Arrow),
        Just(StepType::Bridge),
        Just(StepType::Proposal),
    ]
}

/// Generate a well-formed proposal payload with a random id, status, score,
/// and instant.
pub fn proposal_payload() -> impl Strategy<Value = Value> {
    (entity_id("p"), status(), score(), created_at()).prop_map(|(id, status, score, at)| {
        json!({
            "id": id,
            "kind": "claim",
            "status": status,
            "score": score,
            "method": "ann",
            "evidence": [],
            "created-at": at,
        })
    })
}

/// Generate a raw arrow-typed step; arrows are never cross-checked, so these
/// commit against any store.
pub fn arrow_step() -> impl Strategy<Value = Value> {
    entity_id("a").prop_map(|id| json!({"type": "arrow", "target-id": id}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LedgerFixture;

    proptest! {
        #[test]
        fn test_generated_proposals_commit(payload in proposal_payload()) {
            let fixture = LedgerFixture::new();
            let id = fixture.ledger.record_proposal(payload.clone()).unwrap();
            prop_assert_eq!(id.as_str(), payload["id"].as_str().unwrap());
        }

        #[test]
        fn test_arrow_chains_score_zero(steps in prop::collection::vec(arrow_step(), 1..8)) {
            let fixture = LedgerFixture::new();
            let built = fixture.ledger.build_chain(json!({
                "created-at": FIXTURE_EPOCH_MS,
                "steps": steps,
            })).unwrap();
            prop_assert_eq!(built.softness.total, 0.0);
            prop_assert_eq!(built.softness.average, 0.0);
        }

        #[test]
        fn test_duplicate_submission_never_double_commits(payload in proposal_payload()) {
            let fixture = LedgerFixture::new();
            fixture.ledger.record_proposal(payload.clone()).unwrap();
            let second = fixture.ledger.record_proposal(payload);
            prop_assert!(second.is_err());
            prop_assert_eq!(fixture.ledger.proposals().len(), 1);
        }
    }
}
