//! End-to-end scenarios over the full write path: validation, boundary
//! checks, append-only enforcement, audit, timeline, and chain scoring.

use serde_json::json;

use sidecar_ledger::{read_audit_log, AuditType, Outcome};
use sidecar_ledger_core::{ErrorKind, EventType};
use sidecar_ledger_testkit::fixtures::{
    bridge_payload, chain_payload, fact_payload, promotion_payload, proposal_payload,
    LedgerFixture, FIXTURE_EPOCH_MS,
};

#[test]
fn duplicate_proposal_is_audited() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    let first = ledger.record_proposal(proposal_payload("p-1"));
    assert_eq!(first.unwrap(), "p-1");

    let second = ledger.record_proposal(proposal_payload("p-1")).unwrap_err();
    let errors = second.rejection().unwrap();
    assert_eq!(errors[0].field, "proposal-id");
    assert_eq!(errors[0].kind, ErrorKind::Duplicate);

    let reasons = ledger.failure_reasons("p-1");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].audit_type, AuditType::AppendOnlyViolation);

    let events = ledger.timeline("p-1");
    let outcomes: Vec<Outcome> = events.iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Success, Outcome::Failure]);
}

#[test]
fn missing_proposal_blocks_promotion() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    let err = ledger
        .record_promotion(promotion_payload("pr-1", "missing", "claim"))
        .unwrap_err();
    let errors = err.rejection().unwrap();
    assert_eq!(errors[0].field, "proposal-id");
    assert_eq!(errors[0].kind, ErrorKind::Missing);

    let reasons = ledger.failure_reasons("pr-1");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].audit_type, AuditType::BoundaryViolation);
    assert!(ledger.promotion("pr-1").is_none());
}

#[test]
fn timeline_links_related_records() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    ledger.record_proposal(proposal_payload("p-3")).unwrap();
    ledger
        .record_promotion(promotion_payload("pr-3", "p-3", "claim"))
        .unwrap();
    ledger
        .record_fact(fact_payload("f-3", "claim", "pr-3"))
        .unwrap();

    let events = ledger.timeline("p-3");
    let types: Vec<EventType> = events.iter().map(|e| e.event.event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::ProposalRecorded,
            EventType::PromotionRecorded,
            EventType::FactMaterialized,
        ],
    );
    // Payload builders space created-at out; the order above is timestamp
    // order, not an artifact of insertion.
    assert!(events.windows(2).all(|w| w[0].at <= w[1].at));
}

#[test]
fn chain_softness_scoring() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    fixture.seed_proposal("p-2");
    fixture.seed_bridge("b-1");

    let built = ledger
        .build_chain(chain_payload(
            "c-1",
            json!([
                {"type": "arrow", "target-id": "a-1"},
                {"type": "bridge", "target-id": "b-1"},
                {"type": "proposal", "target-id": "p-2"},
            ]),
        ))
        .unwrap();

    assert_eq!(built.chain_id, "c-1");
    assert_eq!(built.softness.total, 1.5);
    assert_eq!(built.softness.average, 0.5);
    assert_eq!(built.softness.per_step, vec![0.0, 0.5, 1.0]);

    // The stored record carries the same totals.
    let stored = ledger.chain("c-1").unwrap();
    assert_eq!(stored.softness_total, 1.5);
    assert_eq!(stored.softness_average, 0.5);
    assert_eq!(stored.softness_per_step, vec![0.0, 0.5, 1.0]);

    let types: Vec<EventType> = ledger
        .timeline("p-2")
        .iter()
        .map(|e| e.event.event_type)
        .collect();
    assert!(types.contains(&EventType::ChainBuilt));
}

#[test]
fn sense_shift_gate() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    fixture.seed_bridge("b-1");

    // Shift with a recognized gate commits.
    ledger
        .build_chain(chain_payload(
            "c-ok",
            json!([
                {"type": "bridge", "target-id": "b-1", "shift": true, "gate": "typed-arrow"},
            ]),
        ))
        .unwrap();

    // The same step without a gate is a validation failure on step/gate.
    let err = ledger
        .build_chain(chain_payload(
            "c-bad",
            json!([{"type": "bridge", "target-id": "b-1", "shift": true}]),
        ))
        .unwrap_err();
    let errors = err.rejection().unwrap();
    assert_eq!(errors[0].field, "step/gate");
    assert_eq!(errors[0].kind, ErrorKind::Missing);

    let reasons = ledger.failure_reasons("c-bad");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].audit_type, AuditType::ValidationFailure);
}

#[test]
fn kind_mismatch_on_fact() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    fixture.seed_promoted("p-6", "pr-6", "claim");

    let err = ledger
        .record_fact(fact_payload("f-6", "bridge-triple", "pr-6"))
        .unwrap_err();
    let errors = err.rejection().unwrap();
    assert_eq!(errors[0].field, "fact-kind");
    assert_eq!(errors[0].kind, ErrorKind::Mismatch);

    let reasons = ledger.failure_reasons("f-6");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].audit_type, AuditType::BoundaryViolation);
    assert!(ledger.fact("f-6").is_none());
}

#[test]
fn same_event_twice_is_one_success_one_violation() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    let payload = proposal_payload("p-idem");
    assert!(ledger.record_proposal(payload.clone()).is_ok());
    assert!(ledger.record_proposal(payload).is_err());

    let audit = ledger.audit_log();
    let successes = audit
        .iter()
        .filter(|e| e.audit_type == AuditType::Success)
        .count();
    let violations = audit
        .iter()
        .filter(|e| e.audit_type == AuditType::AppendOnlyViolation)
        .count();
    assert_eq!((successes, violations), (1, 1));
}

#[test]
fn audit_file_is_the_durable_mirror() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    ledger.record_proposal(proposal_payload("p-1")).unwrap();
    let _ = ledger.record_promotion(promotion_payload("pr-x", "nope", "claim"));
    fixture.seed_promoted("p-b", "pr-b", "bridge-triple");
    ledger
        .record_bridge_triple(bridge_payload("b-1", "pr-b"))
        .unwrap();

    let on_disk = read_audit_log(fixture.audit_path()).unwrap();
    assert_eq!(on_disk, ledger.audit_log());

    // Every attempt produced exactly one record, failures included.
    assert_eq!(on_disk.len(), 5);
    assert_eq!(on_disk[1].audit_type, AuditType::BoundaryViolation);
}

#[test]
fn chains_survive_later_history() {
    let fixture = LedgerFixture::new();
    let ledger = &fixture.ledger;

    fixture.seed_proposal("p-2");
    let built = ledger
        .build_chain(chain_payload(
            "c-1",
            json!([{"type": "proposal", "target-id": "p-2"}]),
        ))
        .unwrap();

    // Later records referencing the same proposal never rewrite the chain.
    fixture.seed_promoted("p-7", "pr-7", "claim");
    ledger
        .record_promotion(promotion_payload("pr-2", "p-2", "claim"))
        .unwrap();

    let stored = ledger.chain(built.chain_id.as_str()).unwrap();
    assert_eq!(stored.softness_total, 1.0);
    assert_eq!(stored.created_at.as_millis(), FIXTURE_EPOCH_MS + 6_000);
}
