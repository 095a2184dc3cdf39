//! Timeline reconstruction: replaying the audit history per entity.
//!
//! The audit trail is the true history. Reconstruction never traverses the
//! keyed collections; every attempted write against an id, successful or
//! not, is recovered from audit entries alone, so it works equally over the
//! live in-memory list and a file read back with
//! [`read_audit_log`](crate::audit::read_audit_log).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use sidecar_ledger_core::{Event, Timestamp};

use crate::audit::AuditEntry;

/// Whether the audited attempt committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    Failure,
}

/// One attempt touching an entity, labeled and placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimelineEvent {
    pub outcome: Outcome,
    pub event: Event,
    /// Sort key: the entity's `created-at` for successes, the audit instant
    /// for failures. Ties keep audit insertion order.
    pub at: Timestamp,
}

/// The ids an event's payload refers to: the payload `id` itself,
/// `proposal-id`, `promotion-id`, `target.id`, and every chain step's
/// `target-id`. This key list is the sole definition of "touching" an id.
fn referenced_ids(event: &Event) -> Vec<&str> {
    let Some(map) = event.payload.as_object() else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for key in ["id", "proposal-id", "promotion-id"] {
        if let Some(id) = map.get(key).and_then(Value::as_str) {
            ids.push(id);
        }
    }
    if let Some(target_id) = map
        .get("target")
        .and_then(Value::as_object)
        .and_then(|t| t.get("id"))
        .and_then(Value::as_str)
    {
        ids.push(target_id);
    }
    if let Some(steps) = map.get("steps").and_then(Value::as_array) {
        for step in steps {
            if let Some(target_id) = step.get("target-id").and_then(Value::as_str) {
                ids.push(target_id);
            }
        }
    }
    ids
}

/// Whether the event's payload refers to `id` directly.
pub fn touches(event: &Event, id: &str) -> bool {
    referenced_ids(event).iter().any(|r| *r == id)
}

/// All attempts related to `id`, in timestamp order.
///
/// The relation grows as the history replays: an event referring to any
/// already-related id joins the timeline, and the entity id it carries
/// becomes related too. That is what links a fact to the proposal behind
/// its promotion without the fact ever naming the proposal.
pub fn timeline(audit: &[AuditEntry], id: &str) -> Vec<TimelineEvent> {
    let mut related: BTreeSet<String> = BTreeSet::new();
    related.insert(id.to_string());

    let mut events: Vec<TimelineEvent> = Vec::new();
    for entry in audit {
        let refs = referenced_ids(&entry.event);
        if !refs.iter().any(|r| related.contains(*r)) {
            continue;
        }
        if let Some(own_id) = entry.event.payload.get("id").and_then(Value::as_str) {
            related.insert(own_id.to_string());
        }

        let outcome = if entry.audit_type.is_failure() {
            Outcome::Failure
        } else {
            Outcome::Success
        };
        let at = match outcome {
            Outcome::Success => entry
                .event
                .payload
                .get("created-at")
                .and_then(Value::as_i64)
                .map(Timestamp::from_millis)
                .unwrap_or(entry.at),
            Outcome::Failure => entry.at,
        };
        events.push(TimelineEvent {
            outcome,
            event: entry.event.clone(),
            at,
        });
    }

    // Stable sort keeps audit insertion order for equal timestamps.
    events.sort_by_key(|e| e.at);
    events
}

/// The failure-typed audit entries whose event refers to `id` directly, in
/// audit order.
pub fn failure_reasons(audit: &[AuditEntry], id: &str) -> Vec<AuditEntry> {
    audit
        .iter()
        .filter(|entry| entry.audit_type.is_failure() && touches(&entry.event, id))
        .cloned()
        .collect()
}
