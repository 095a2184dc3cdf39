//! The ledger: validated, append-only, audited record store.
//!
//! Every record operation follows the same path: fill `created-at`, wrap the
//! payload in an event envelope, validate, run boundary checks against the
//! current state, check id uniqueness, then audit and insert. Rejection is
//! final; the caller resubmits corrections as a new event.
//!
//! Ordering is write-ahead: the success audit record reaches the file before
//! the in-memory insert, so the durable log is never behind the store. The
//! only artifact a crash can leave is a torn final line, which readers
//! discard.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use sidecar_ledger_core::{
    score_steps, validate, validate_bridge_triple, Action, BridgeTriple, Chain, ChainStep,
    DecodeError, EntityId, Event, EventType, Evidence, Fact, FieldError, Promotion, Proposal,
    Softness, Timestamp, BRIDGE_TRIPLE_KIND,
};

use crate::audit::{default_audit_path, AuditEntry, AuditType, FileAuditSink};
use crate::clock::{Clock, SystemClock};
use crate::error::{LedgerError, Result};
use crate::id::{IdGen, RandomIdGen};
use crate::timeline::{self, TimelineEvent};

/// Outcome of a committed chain build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltChain {
    pub chain_id: EntityId,
    pub softness: Softness,
}

/// The sidecar ledger.
///
/// Single-writer, multi-reader: record operations are linearized through one
/// mutex around the state transition; accessors return cloned snapshots, so
/// a reader observes either the pre-write or the post-write state of each
/// operation, never a torn intermediate.
pub struct Ledger {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGen>,
    inner: Mutex<LedgerState>,
}

struct LedgerState {
    proposals: BTreeMap<EntityId, Proposal>,
    promotions: BTreeMap<EntityId, Promotion>,
    evidence: BTreeMap<EntityId, Evidence>,
    actions: BTreeMap<EntityId, Action>,
    facts: BTreeMap<EntityId, Fact>,
    bridge_triples: BTreeMap<EntityId, BridgeTriple>,
    chains: BTreeMap<EntityId, Chain>,
    audit: Vec<AuditEntry>,
    sink: FileAuditSink,
}

/// The record operation being admitted. Facts and bridge triples share the
/// `fact-materialized` event tag; bridges additionally land in their index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Proposal,
    Promotion,
    Evidence,
    Action,
    Fact,
    BridgeTriple,
    Chain,
}

impl OpKind {
    fn event_type(self) -> EventType {
        match self {
            OpKind::Proposal => EventType::ProposalRecorded,
            OpKind::Promotion => EventType::PromotionRecorded,
            OpKind::Evidence => EventType::EvidenceAttached,
            OpKind::Action => EventType::ActionRecorded,
            OpKind::Fact | OpKind::BridgeTriple => EventType::FactMaterialized,
            OpKind::Chain => EventType::ChainBuilt,
        }
    }

    /// Field name used for duplicate-id rejections. Bridge triples fail the
    /// same way the underlying fact write would.
    fn id_field(self) -> &'static str {
        match self {
            OpKind::Proposal => "proposal-id",
            OpKind::Promotion => "promotion-id",
            OpKind::Evidence => "evidence-id",
            OpKind::Action => "action-id",
            OpKind::Fact | OpKind::BridgeTriple => "fact-id",
            OpKind::Chain => "chain-id",
        }
    }
}

/// A decoded, ready-to-insert record. Built before the success audit is
/// written so a decode fault cannot leave the log claiming a commit that
/// never landed.
enum Prepared {
    Proposal(Proposal),
    Promotion(Promotion),
    Evidence(Evidence),
    Action(Action),
    Fact(Fact),
    Bridge(Fact, BridgeTriple),
    Chain(Chain),
}

struct Committed {
    id: EntityId,
    softness: Option<Softness>,
}

impl Ledger {
    /// Create a ledger with explicit capabilities.
    pub fn new(sink: FileAuditSink, clock: Arc<dyn Clock>, ids: Arc<dyn IdGen>) -> Self {
        Self {
            clock,
            ids,
            inner: Mutex::new(LedgerState {
                proposals: BTreeMap::new(),
                promotions: BTreeMap::new(),
                evidence: BTreeMap::new(),
                actions: BTreeMap::new(),
                facts: BTreeMap::new(),
                bridge_triples: BTreeMap::new(),
                chains: BTreeMap::new(),
                audit: Vec::new(),
                sink,
            }),
        }
    }

    /// Create a ledger auditing to the given path, with the real clock and
    /// random ids.
    pub fn with_audit_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self::new(
            FileAuditSink::new(path)?,
            Arc::new(SystemClock),
            Arc::new(RandomIdGen),
        ))
    }

    /// Create a ledger at the environment-resolved default audit path
    /// (`LOG_ROOT`, falling back to `./log`). The environment is read here,
    /// once, and never again.
    pub fn open_default() -> io::Result<Self> {
        Self::with_audit_path(default_audit_path())
    }

    /// Where this ledger's audit file lives.
    pub fn audit_path(&self) -> PathBuf {
        self.inner.lock().unwrap().sink.path().to_path_buf()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Record operations
    // ─────────────────────────────────────────────────────────────────────

    /// Record a candidate claim.
    pub fn record_proposal(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::Proposal, payload)?.id)
    }

    /// Record a reviewer decision over a stored proposal.
    pub fn record_promotion(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::Promotion, payload)?.id)
    }

    /// Attach evidence to a stored proposal or promotion.
    pub fn record_evidence(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::Evidence, payload)?.id)
    }

    /// Record reviewer or agent activity.
    pub fn record_action(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::Action, payload)?.id)
    }

    /// Materialize a fact authorized by a stored promotion. The payload must
    /// carry the accompanying `promotion-id`.
    pub fn record_fact(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::Fact, payload)?.id)
    }

    /// Record a bridge triple: a fact of kind `bridge-triple` plus an entry
    /// in the bridge index. If the fact write fails, the bridge write fails
    /// identically; there is no partial success.
    pub fn record_bridge_triple(&self, payload: Value) -> Result<EntityId> {
        Ok(self.admit(OpKind::BridgeTriple, payload)?.id)
    }

    /// Assemble and commit a chain, scoring its softness. A missing `id` is
    /// generated.
    pub fn build_chain(&self, payload: Value) -> Result<BuiltChain> {
        let committed = self.admit(OpKind::Chain, payload)?;
        Ok(BuiltChain {
            chain_id: committed.id,
            softness: committed.softness.expect("chain commits carry softness"),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Observable state
    // ─────────────────────────────────────────────────────────────────────

    pub fn proposals(&self) -> Vec<Proposal> {
        self.inner.lock().unwrap().proposals.values().cloned().collect()
    }

    pub fn proposal(&self, id: &str) -> Option<Proposal> {
        self.inner.lock().unwrap().proposals.get(id).cloned()
    }

    pub fn promotions(&self) -> Vec<Promotion> {
        self.inner.lock().unwrap().promotions.values().cloned().collect()
    }

    pub fn promotion(&self, id: &str) -> Option<Promotion> {
        self.inner.lock().unwrap().promotions.get(id).cloned()
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        self.inner.lock().unwrap().evidence.values().cloned().collect()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.lock().unwrap().actions.values().cloned().collect()
    }

    pub fn action(&self, id: &str) -> Option<Action> {
        self.inner.lock().unwrap().actions.get(id).cloned()
    }

    pub fn facts(&self) -> Vec<Fact> {
        self.inner.lock().unwrap().facts.values().cloned().collect()
    }

    pub fn fact(&self, id: &str) -> Option<Fact> {
        self.inner.lock().unwrap().facts.get(id).cloned()
    }

    pub fn bridge_triples(&self) -> Vec<BridgeTriple> {
        self.inner.lock().unwrap().bridge_triples.values().cloned().collect()
    }

    pub fn bridge_triple(&self, id: &str) -> Option<BridgeTriple> {
        self.inner.lock().unwrap().bridge_triples.get(id).cloned()
    }

    pub fn chains(&self) -> Vec<Chain> {
        self.inner.lock().unwrap().chains.values().cloned().collect()
    }

    pub fn chain(&self, id: &str) -> Option<Chain> {
        self.inner.lock().unwrap().chains.get(id).cloned()
    }

    /// The full in-memory audit list, in linearization order.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.inner.lock().unwrap().audit.clone()
    }

    /// Every attempt touching `id`, labeled and sorted. See the timeline
    /// module for the relation and sort key.
    pub fn timeline(&self, id: &str) -> Vec<TimelineEvent> {
        timeline::timeline(&self.inner.lock().unwrap().audit, id)
    }

    /// The failure-typed audit entries touching `id`, in audit order.
    pub fn failure_reasons(&self, id: &str) -> Vec<AuditEntry> {
        timeline::failure_reasons(&self.inner.lock().unwrap().audit, id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // The write path
    // ─────────────────────────────────────────────────────────────────────

    fn admit(&self, op: OpKind, mut payload: Value) -> Result<Committed> {
        let mut state = self.inner.lock().unwrap();

        // 1. Fill what the caller may omit: created-at always, the id for
        //    chains only.
        if let Some(map) = payload.as_object_mut() {
            if !has_value(map, "created-at") {
                map.insert(
                    "created-at".to_string(),
                    json!(self.clock.now().as_millis()),
                );
            }
            if op == OpKind::Chain && !has_value(map, "id") {
                map.insert(
                    "id".to_string(),
                    Value::String(self.ids.gen_id("chain").as_str().to_string()),
                );
            }
        }

        // 2. Envelope with a fresh event id.
        let event = Event::new(
            op.event_type(),
            self.ids.gen_id("evt"),
            self.clock.now(),
            payload,
        );

        // 3. Shape validation. Bridge submissions carry their own shape even
        //    though they travel under the fact tag.
        let shape = match op {
            OpKind::BridgeTriple => validate_bridge_triple(&event.payload),
            _ => validate(&event),
        };
        if let Err(errors) = shape {
            return Err(self.reject(&mut state, event, AuditType::ValidationFailure, errors));
        }

        // 4. Boundary checks against current state.
        if let Some(error) = boundary_check(&state, op, &event.payload) {
            return Err(self.reject(
                &mut state,
                event,
                AuditType::BoundaryViolation,
                vec![error],
            ));
        }

        // 5. Append-only: a stored id is never replaced.
        let id = payload_id(&event.payload);
        if is_duplicate(&state, op, &id) {
            let error = FieldError::duplicate(op.id_field(), "id already recorded")
                .with_detail(json!(id.as_str()));
            return Err(self.reject(
                &mut state,
                event,
                AuditType::AppendOnlyViolation,
                vec![error],
            ));
        }

        // 6. Decode, audit (write-ahead), insert.
        let prepared = prepare(op, &event)?;
        let entry = AuditEntry {
            audit_type: AuditType::Success,
            event,
            errors: None,
            at: self.clock.now(),
        };
        state.sink.append(&entry)?;
        state.audit.push(entry);

        let committed = apply(&mut state, prepared);
        tracing::debug!(id = %committed.id, op = ?op, "write committed");
        Ok(committed)
    }

    /// Record a failure in the audit trail and hand the rejection back.
    ///
    /// If the audit append itself fails, the i/o fault wins: the rejection
    /// was never durably recorded, so the caller sees the sink error and the
    /// rejection details go to the log.
    fn reject(
        &self,
        state: &mut LedgerState,
        event: Event,
        audit_type: AuditType,
        errors: Vec<FieldError>,
    ) -> LedgerError {
        tracing::warn!(
            event = %event.event_type,
            audit = %audit_type,
            errors = errors.len(),
            "write rejected"
        );
        let entry = AuditEntry {
            audit_type,
            event,
            errors: Some(errors.clone()),
            at: self.clock.now(),
        };
        if let Err(io_err) = state.sink.append(&entry) {
            tracing::error!(error = %io_err, rejected = ?errors, "audit append failed");
            return LedgerError::Audit(io_err);
        }
        state.audit.push(entry);
        LedgerError::Rejected(errors)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Boundary checks
// ─────────────────────────────────────────────────────────────────────────

/// First referential violation, if any. Violations are disjoint by
/// construction, so one is enough.
fn boundary_check(state: &LedgerState, op: OpKind, payload: &Value) -> Option<FieldError> {
    let map = payload.as_object()?;

    match op {
        OpKind::Proposal | OpKind::Action => None,

        OpKind::Promotion => {
            let proposal_id = str_field(map, "proposal-id");
            if state.proposals.contains_key(proposal_id) {
                None
            } else {
                Some(
                    FieldError::missing("proposal-id", "proposal not found")
                        .with_detail(json!(proposal_id)),
                )
            }
        }

        OpKind::Evidence => {
            let target = map.get("target").and_then(Value::as_object)?;
            let target_type = str_field(target, "type");
            let target_id = str_field(target, "id");
            let found = match target_type {
                "proposal" => state.proposals.contains_key(target_id),
                "promotion" => state.promotions.contains_key(target_id),
                _ => false,
            };
            if found {
                None
            } else {
                Some(
                    FieldError::missing("target/id", format!("{target_type} not found"))
                        .with_detail(json!(target_id)),
                )
            }
        }

        OpKind::Fact | OpKind::BridgeTriple => {
            let Some(promotion_id) = map.get("promotion-id").and_then(Value::as_str) else {
                return Some(FieldError::missing(
                    "promotion-id",
                    "fact requires an accompanying promotion-id",
                ));
            };
            let Some(promotion) = state.promotions.get(promotion_id) else {
                return Some(
                    FieldError::missing("promotion-id", "promotion not found")
                        .with_detail(json!(promotion_id)),
                );
            };
            let fact_kind = match op {
                OpKind::BridgeTriple => BRIDGE_TRIPLE_KIND,
                _ => str_field(map, "kind"),
            };
            if promotion.kind != fact_kind {
                return Some(
                    FieldError::mismatch("fact-kind", "fact kind must match promotion kind")
                        .with_detail(json!({
                            "fact-kind": fact_kind,
                            "promotion-kind": promotion.kind,
                        })),
                );
            }
            None
        }

        OpKind::Chain => {
            let steps = map.get("steps").and_then(Value::as_array)?;
            for (index, step) in steps.iter().enumerate() {
                let step_type = step.get("type").and_then(Value::as_str).unwrap_or_default();
                let target_id = step
                    .get("target-id")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let missing = match step_type {
                    "proposal" => (!state.proposals.contains_key(target_id))
                        .then_some("proposal not found"),
                    "bridge" => (!state.bridge_triples.contains_key(target_id))
                        .then_some("bridge triple not found"),
                    // Arrows live in external structure; no cross-check.
                    _ => None,
                };
                if let Some(message) = missing {
                    return Some(FieldError::missing("step/target-id", message).with_detail(
                        json!({ "step": index, "target-id": target_id }),
                    ));
                }
            }
            None
        }
    }
}

fn is_duplicate(state: &LedgerState, op: OpKind, id: &EntityId) -> bool {
    let id = id.as_str();
    match op {
        OpKind::Proposal => state.proposals.contains_key(id),
        OpKind::Promotion => state.promotions.contains_key(id),
        OpKind::Evidence => state.evidence.contains_key(id),
        OpKind::Action => state.actions.contains_key(id),
        // Bridge ids share the fact id space; the fact check covers both.
        OpKind::Fact | OpKind::BridgeTriple => state.facts.contains_key(id),
        OpKind::Chain => state.chains.contains_key(id),
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Decode and insert
// ─────────────────────────────────────────────────────────────────────────

fn prepare(op: OpKind, event: &Event) -> Result<Prepared> {
    Ok(match op {
        OpKind::Proposal => Prepared::Proposal(event.decode_payload()?),
        OpKind::Promotion => Prepared::Promotion(event.decode_payload()?),
        OpKind::Evidence => Prepared::Evidence(event.decode_payload()?),
        OpKind::Action => Prepared::Action(event.decode_payload()?),
        OpKind::Fact => Prepared::Fact(event.decode_payload()?),
        OpKind::BridgeTriple => {
            let bridge = decode_bridge(&event.payload);
            let fact = bridge_fact(&bridge, &event.payload);
            Prepared::Bridge(fact, bridge)
        }
        OpKind::Chain => {
            let map = event.payload.as_object().cloned().unwrap_or_default();
            let steps: Vec<ChainStep> = serde_json::from_value(
                map.get("steps").cloned().unwrap_or(Value::Array(vec![])),
            )
            .map_err(DecodeError::from)?;
            let softness = score_steps(&steps);
            Prepared::Chain(Chain {
                id: payload_id(&event.payload),
                created_at: payload_created_at(&event.payload),
                steps,
                softness_total: softness.total,
                softness_average: softness.average,
                softness_per_step: softness.per_step,
            })
        }
    })
}

/// Bridge payloads carry `promotion-id` next to the triple fields, so they
/// are split by hand rather than decoded whole.
fn decode_bridge(payload: &Value) -> BridgeTriple {
    let field = |key: &str| payload.get(key).and_then(Value::as_str).map(String::from);
    BridgeTriple {
        id: payload_id(payload),
        created_at: payload_created_at(payload),
        subject: field("subject"),
        predicate: field("predicate"),
        object: field("object"),
        rationale: field("rationale"),
    }
}

/// The fact half of a bridge write: kind `bridge-triple`, body holding the
/// triple fields that were supplied.
fn bridge_fact(bridge: &BridgeTriple, payload: &Value) -> Fact {
    let mut body = Map::new();
    for key in ["subject", "predicate", "object", "rationale"] {
        if let Some(value) = payload.get(key) {
            if !value.is_null() {
                body.insert(key.to_string(), value.clone());
            }
        }
    }
    Fact {
        id: bridge.id.clone(),
        kind: BRIDGE_TRIPLE_KIND.to_string(),
        body: if body.is_empty() {
            None
        } else {
            Some(Value::Object(body))
        },
        created_at: bridge.created_at,
        promotion_id: payload
            .get("promotion-id")
            .and_then(Value::as_str)
            .map(EntityId::from)
            .unwrap_or_else(|| EntityId::new("")),
    }
}

fn apply(state: &mut LedgerState, prepared: Prepared) -> Committed {
    match prepared {
        Prepared::Proposal(p) => {
            let id = p.id.clone();
            state.proposals.insert(id.clone(), p);
            Committed { id, softness: None }
        }
        Prepared::Promotion(p) => {
            let id = p.id.clone();
            state.promotions.insert(id.clone(), p);
            Committed { id, softness: None }
        }
        Prepared::Evidence(e) => {
            let id = e.id.clone();
            state.evidence.insert(id.clone(), e);
            Committed { id, softness: None }
        }
        Prepared::Action(a) => {
            let id = a.id.clone();
            state.actions.insert(id.clone(), a);
            Committed { id, softness: None }
        }
        Prepared::Fact(f) => {
            let id = f.id.clone();
            state.facts.insert(id.clone(), f);
            Committed { id, softness: None }
        }
        Prepared::Bridge(fact, bridge) => {
            let id = bridge.id.clone();
            state.facts.insert(id.clone(), fact);
            state.bridge_triples.insert(id.clone(), bridge);
            Committed { id, softness: None }
        }
        Prepared::Chain(chain) => {
            let id = chain.id.clone();
            let softness = Softness {
                total: chain.softness_total,
                average: chain.softness_average,
                per_step: chain.softness_per_step.clone(),
            };
            state.chains.insert(id.clone(), chain);
            Committed {
                id,
                softness: Some(softness),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Payload helpers (valid after the shape pass)
// ─────────────────────────────────────────────────────────────────────────

fn has_value(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn payload_id(payload: &Value) -> EntityId {
    EntityId::new(payload.get("id").and_then(Value::as_str).unwrap_or_default())
}

fn payload_created_at(payload: &Value) -> Timestamp {
    Timestamp::from_millis(
        payload
            .get("created-at")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
    )
}
