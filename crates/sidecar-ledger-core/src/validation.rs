//! Event validation: structural and type checks over submitted payloads.
//!
//! The validator is a pure function of the event. It gathers every objection
//! before returning so audit entries carry the full failure set; reviewers
//! learn as much from rejected writes as from accepted ones.

use serde_json::{json, Map, Value};

use crate::chain::{ShiftGate, StepType};
use crate::error::FieldError;
use crate::event::{Event, EventType};
use crate::record::{ProposalStatus, TargetType};

type Errors = Vec<FieldError>;

/// Validate one event envelope plus payload.
///
/// Returns every structural objection at once. Referential checks against
/// the store are the ledger's boundary pass, not the validator's concern.
pub fn validate(event: &Event) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    // Envelope: the tag and instant are enforced by the types; the id can
    // still be blank if a broken id source is injected.
    if event.id.is_empty() {
        errors.push(FieldError::invalid("id", "event id must be non-empty"));
    }

    match event.payload.as_object() {
        Some(map) => match event.event_type {
            EventType::ProposalRecorded => check_proposal(map, &mut errors),
            EventType::PromotionRecorded => check_promotion(map, &mut errors),
            EventType::EvidenceAttached => check_evidence(map, &mut errors),
            EventType::ActionRecorded => check_action(map, &mut errors),
            EventType::FactMaterialized => check_fact(map, &mut errors),
            EventType::ChainBuilt => check_chain(map, &mut errors),
        },
        None => errors.push(FieldError::invalid("payload", "payload must be a map")),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a bridge-triple submission before it is funneled through the
/// fact pathway. Bridge payloads share the fact envelope (`fact-materialized`)
/// but carry their own shape.
pub fn validate_bridge_triple(payload: &Value) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    match payload.as_object() {
        Some(map) => {
            require_non_blank(map, "id", &mut errors);
            require_timestamp(map, "created-at", &mut errors);
            for key in ["subject", "predicate", "object", "rationale"] {
                optional_string(map, key, &mut errors);
            }
            optional_string(map, "promotion-id", &mut errors);
            check_unknown_keys(
                map,
                &[
                    "id",
                    "subject",
                    "predicate",
                    "object",
                    "rationale",
                    "created-at",
                    "promotion-id",
                ],
                &mut errors,
            );
        }
        None => errors.push(FieldError::invalid("payload", "payload must be a map")),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Per-payload checks
// ─────────────────────────────────────────────────────────────────────────

fn check_proposal(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_non_blank(map, "kind", errors);
    optional_string(map, "target-id", errors);
    require_enum::<ProposalStatus>(
        map,
        "status",
        "status must be one of pending, accepted, rejected",
        errors,
    );
    match map.get("score") {
        None | Some(Value::Null) => errors.push(FieldError::missing("score", "score is required")),
        Some(value) => match value.as_f64() {
            Some(score) if (0.0..=1.0).contains(&score) => {}
            Some(score) => errors.push(
                FieldError::invalid("score", "score must lie in [0.0, 1.0]")
                    .with_detail(json!(score)),
            ),
            None => errors.push(
                FieldError::invalid("score", "score must be a number").with_detail(value.clone()),
            ),
        },
    }
    require_non_blank(map, "method", errors);
    match map.get("evidence") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("evidence", "evidence is required"))
        }
        Some(value) if !value.is_array() => errors.push(
            FieldError::invalid("evidence", "evidence must be a collection")
                .with_detail(value.clone()),
        ),
        Some(_) => {}
    }
    require_timestamp(map, "created-at", errors);
    check_unknown_keys(
        map,
        &[
            "id",
            "kind",
            "target-id",
            "status",
            "score",
            "method",
            "evidence",
            "created-at",
        ],
        errors,
    );
}

fn check_promotion(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_non_blank(map, "proposal-id", errors);
    require_non_blank(map, "kind", errors);
    optional_string(map, "target-id", errors);
    require_non_blank(map, "decided-by", errors);
    require_non_blank(map, "rationale", errors);
    require_timestamp(map, "created-at", errors);
    check_unknown_keys(
        map,
        &[
            "id",
            "proposal-id",
            "kind",
            "target-id",
            "decided-by",
            "rationale",
            "created-at",
        ],
        errors,
    );
}

fn check_evidence(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_non_blank(map, "method", errors);
    require_timestamp(map, "created-at", errors);
    match map.get("payload") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("payload", "payload is required"))
        }
        Some(value) if !value.is_array() && !value.is_object() => errors.push(
            FieldError::invalid("payload", "payload must be a collection")
                .with_detail(value.clone()),
        ),
        Some(_) => {}
    }

    // Unknown keys inside the target are reported alongside the payload's
    // own, prefixed, in the single unknown-fields error.
    let mut stray: Vec<String> = map
        .keys()
        .filter(|k| !["id", "target", "method", "payload", "created-at"].contains(&k.as_str()))
        .cloned()
        .collect();

    match map.get("target") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("target", "target is required"))
        }
        Some(Value::Object(target)) => {
            match target.get("type") {
                None | Some(Value::Null) => {
                    errors.push(FieldError::missing("target/type", "target type is required"))
                }
                Some(value) => {
                    if serde_json::from_value::<TargetType>(value.clone()).is_err() {
                        errors.push(
                            FieldError::invalid(
                                "target/type",
                                "target type must be proposal or promotion",
                            )
                            .with_detail(value.clone()),
                        );
                    }
                }
            }
            match target.get("id") {
                None | Some(Value::Null) => {
                    errors.push(FieldError::missing("target/id", "target id is required"))
                }
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(value) => errors.push(
                    FieldError::invalid("target/id", "target id must be non-blank")
                        .with_detail(value.clone()),
                ),
            }
            stray.extend(
                target
                    .keys()
                    .filter(|k| !["type", "id"].contains(&k.as_str()))
                    .map(|k| format!("target/{k}")),
            );
        }
        Some(value) => errors.push(
            FieldError::invalid("target", "target must be a map").with_detail(value.clone()),
        ),
    }

    if !stray.is_empty() {
        stray.sort();
        errors.push(
            FieldError::unknown("unknown-fields", "payload carries unrecognized fields")
                .with_detail(json!(stray)),
        );
    }
}

fn check_action(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_non_blank(map, "type", errors);
    require_timestamp(map, "created-at", errors);
    // actor and note are free-form when present
    check_unknown_keys(map, &["id", "type", "actor", "note", "created-at"], errors);
}

fn check_fact(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_non_blank(map, "kind", errors);
    require_timestamp(map, "created-at", errors);
    // body is free-form; promotion-id presence is a boundary concern
    optional_string(map, "promotion-id", errors);
    check_unknown_keys(
        map,
        &["id", "kind", "body", "created-at", "promotion-id"],
        errors,
    );
}

fn check_chain(map: &Map<String, Value>, errors: &mut Errors) {
    require_non_blank(map, "id", errors);
    require_timestamp(map, "created-at", errors);

    let mut stray: Vec<String> = map
        .keys()
        .filter(|k| !["id", "created-at", "steps"].contains(&k.as_str()))
        .cloned()
        .collect();

    match map.get("steps") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("steps", "steps are required"))
        }
        Some(Value::Array(steps)) if steps.is_empty() => {
            errors.push(FieldError::invalid("steps", "steps must be non-empty"))
        }
        Some(Value::Array(steps)) => {
            for (index, step) in steps.iter().enumerate() {
                check_step(index, step, &mut stray, errors);
            }
        }
        Some(value) => errors.push(
            FieldError::invalid("steps", "steps must be a collection").with_detail(value.clone()),
        ),
    }

    if !stray.is_empty() {
        stray.sort();
        errors.push(
            FieldError::unknown("unknown-fields", "payload carries unrecognized fields")
                .with_detail(json!(stray)),
        );
    }
}

fn check_step(index: usize, step: &Value, stray: &mut Vec<String>, errors: &mut Errors) {
    let Some(map) = step.as_object() else {
        errors.push(
            FieldError::invalid("steps", "each step must be a map").with_detail(json!(index)),
        );
        return;
    };

    match map.get("type") {
        None | Some(Value::Null) => errors.push(
            FieldError::missing("step/type", "step type is required").with_detail(json!(index)),
        ),
        Some(value) => {
            if serde_json::from_value::<StepType>(value.clone()).is_err() {
                errors.push(
                    FieldError::invalid("step/type", "step type must be arrow, bridge, or proposal")
                        .with_detail(json!({ "step": index, "value": value })),
                );
            }
        }
    }

    match map.get("target-id") {
        None | Some(Value::Null) => errors.push(
            FieldError::missing("step/target-id", "step target-id is required")
                .with_detail(json!(index)),
        ),
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(value) => errors.push(
            FieldError::invalid("step/target-id", "step target-id must be non-blank")
                .with_detail(json!({ "step": index, "value": value })),
        ),
    }

    let shift = match map.get("shift") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(value) => {
            errors.push(
                FieldError::invalid("step/shift", "shift must be a boolean")
                    .with_detail(json!({ "step": index, "value": value })),
            );
            false
        }
    };

    // The sense-shift gate: a shift hop must carry a recognized warrant.
    // Gates on non-shift hops are advisory and accepted as-is.
    match map.get("gate") {
        None | Some(Value::Null) => {
            if shift {
                errors.push(
                    FieldError::missing("step/gate", "sense-shift step requires a gate")
                        .with_detail(json!(index)),
                );
            }
        }
        Some(value) => {
            if serde_json::from_value::<ShiftGate>(value.clone()).is_err() {
                errors.push(
                    FieldError::invalid("step/gate", "gate must be typed-arrow or bridge-triple")
                        .with_detail(json!({ "step": index, "value": value })),
                );
            }
        }
    }

    match map.get("notes") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(value) => errors.push(
            FieldError::invalid("step/notes", "notes must be a string")
                .with_detail(json!({ "step": index, "value": value })),
        ),
    }

    stray.extend(
        map.keys()
            .filter(|k| !["type", "target-id", "shift", "gate", "notes"].contains(&k.as_str()))
            .map(|k| format!("steps/{index}/{k}")),
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Field helpers
// ─────────────────────────────────────────────────────────────────────────

fn require_non_blank<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    errors: &mut Errors,
) -> Option<&'a str> {
    match map.get(key) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(key, format!("{key} is required")));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::String(_)) => {
            errors.push(FieldError::invalid(key, format!("{key} must be non-blank")));
            None
        }
        Some(value) => {
            errors.push(
                FieldError::invalid(key, format!("{key} must be a string"))
                    .with_detail(value.clone()),
            );
            None
        }
    }
}

fn optional_string<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    errors: &mut Errors,
) -> Option<&'a str> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(value) => {
            errors.push(
                FieldError::invalid(key, format!("{key} must be a non-blank string when present"))
                    .with_detail(value.clone()),
            );
            None
        }
    }
}

fn require_timestamp(map: &Map<String, Value>, key: &str, errors: &mut Errors) {
    match map.get(key) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(key, format!("{key} is required")))
        }
        Some(value) if value.as_i64().is_some() => {}
        Some(value) => errors.push(
            FieldError::invalid(key, format!("{key} must be a timestamp in unix milliseconds"))
                .with_detail(value.clone()),
        ),
    }
}

/// Check an enum-valued field by round-tripping through its typed variant.
fn require_enum<T: serde::de::DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
    message: &str,
    errors: &mut Errors,
) {
    match map.get(key) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(key, format!("{key} is required")))
        }
        Some(value) => {
            if serde_json::from_value::<T>(value.clone()).is_err() {
                errors.push(FieldError::invalid(key, message).with_detail(value.clone()));
            }
        }
    }
}

fn check_unknown_keys(map: &Map<String, Value>, allowed: &[&str], errors: &mut Errors) {
    let mut unknown: Vec<String> = map
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(
            FieldError::unknown("unknown-fields", "payload carries unrecognized fields")
                .with_detail(json!(unknown)),
        );
    }
}
