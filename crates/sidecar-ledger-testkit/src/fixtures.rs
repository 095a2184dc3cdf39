//! Test fixtures and helpers.
//!
//! Common setup code for ledger tests: a temp-dir audit file, a controllable
//! clock, and sequential ids so assertions stay deterministic.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use sidecar_ledger::{Clock, FileAuditSink, IdGen, Ledger};
use sidecar_ledger_core::{EntityId, Timestamp};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Pin the clock to an instant.
    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now.load(Ordering::SeqCst))
    }
}

/// Sequential id generator: `prefix-00000001`, `prefix-00000002`, ...
#[derive(Debug, Default)]
pub struct SeqIdGen {
    next: AtomicU64,
}

impl SeqIdGen {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdGen for SeqIdGen {
    fn gen_id(&self, prefix: &str) -> EntityId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        EntityId::new(format!("{prefix}-{n:08x}"))
    }
}

/// A ledger wired to a temp-dir audit file, a fixed clock, and sequential
/// ids. Dropping the fixture removes the audit file with its directory.
pub struct LedgerFixture {
    dir: TempDir,
    pub clock: Arc<FixedClock>,
    pub ids: Arc<SeqIdGen>,
    pub ledger: Ledger,
}

/// Fixture epoch: 2024-01-01T00:00:00Z.
pub const FIXTURE_EPOCH_MS: i64 = 1_704_067_200_000;

impl LedgerFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create fixture dir");
        let sink = FileAuditSink::new(dir.path().join("sidecar-audit.jsonl"))
            .expect("create fixture sink");
        let clock = Arc::new(FixedClock::new(FIXTURE_EPOCH_MS));
        let ids = Arc::new(SeqIdGen::new());
        let ledger = Ledger::new(sink, clock.clone(), ids.clone());
        Self {
            dir,
            clock,
            ids,
            ledger,
        }
    }

    pub fn audit_path(&self) -> PathBuf {
        self.dir.path().join("sidecar-audit.jsonl")
    }

    /// Record a pending proposal of kind `claim`, panicking on rejection.
    pub fn seed_proposal(&self, id: &str) -> EntityId {
        self.ledger
            .record_proposal(proposal_payload(id))
            .expect("seed proposal")
    }

    /// Record a proposal and promote it under the given kind.
    pub fn seed_promoted(&self, proposal_id: &str, promotion_id: &str, kind: &str) -> EntityId {
        let mut proposal = proposal_payload(proposal_id);
        proposal["kind"] = json!(kind);
        self.ledger
            .record_proposal(proposal)
            .expect("seed proposal");
        self.ledger
            .record_promotion(promotion_payload(promotion_id, proposal_id, kind))
            .expect("seed promotion")
    }

    /// Record a full proposal → promotion → bridge-triple lineage.
    pub fn seed_bridge(&self, bridge_id: &str) -> EntityId {
        let proposal_id = format!("p-for-{bridge_id}");
        let promotion_id = format!("pr-for-{bridge_id}");
        self.seed_promoted(&proposal_id, &promotion_id, "bridge-triple");
        self.ledger
            .record_bridge_triple(bridge_payload(bridge_id, &promotion_id))
            .expect("seed bridge triple")
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Payload builders
// ─────────────────────────────────────────────────────────────────────────

/// A well-formed pending proposal payload.
pub fn proposal_payload(id: &str) -> Value {
    json!({
        "id": id,
        "kind": "claim",
        "status": "pending",
        "score": 0.42,
        "method": "ann",
        "evidence": [],
        "created-at": FIXTURE_EPOCH_MS,
    })
}

/// A well-formed promotion payload over `proposal_id`.
pub fn promotion_payload(id: &str, proposal_id: &str, kind: &str) -> Value {
    json!({
        "id": id,
        "proposal-id": proposal_id,
        "kind": kind,
        "decided-by": "reviewer",
        "rationale": "verified against source",
        "created-at": FIXTURE_EPOCH_MS + 1_000,
    })
}

/// A well-formed evidence payload targeting a proposal or promotion.
pub fn evidence_payload(id: &str, target_type: &str, target_id: &str) -> Value {
    json!({
        "id": id,
        "target": {"type": target_type, "id": target_id},
        "method": "manual",
        "payload": [{"note": "seen in corpus"}],
        "created-at": FIXTURE_EPOCH_MS + 2_000,
    })
}

/// A minimal action payload.
pub fn action_payload(id: &str, action_type: &str) -> Value {
    json!({
        "id": id,
        "type": action_type,
        "created-at": FIXTURE_EPOCH_MS + 3_000,
    })
}

/// A well-formed fact payload authorized by `promotion_id`.
pub fn fact_payload(id: &str, kind: &str, promotion_id: &str) -> Value {
    json!({
        "id": id,
        "kind": kind,
        "body": {"text": "materialized claim"},
        "created-at": FIXTURE_EPOCH_MS + 4_000,
        "promotion-id": promotion_id,
    })
}

/// A well-formed bridge-triple payload authorized by `promotion_id`.
pub fn bridge_payload(id: &str, promotion_id: &str) -> Value {
    json!({
        "id": id,
        "subject": "bank",
        "predicate": "sense-shift",
        "object": "river-bank",
        "rationale": "polysemy",
        "created-at": FIXTURE_EPOCH_MS + 5_000,
        "promotion-id": promotion_id,
    })
}

/// A chain payload over the given raw steps.
pub fn chain_payload(id: &str, steps: Value) -> Value {
    json!({
        "id": id,
        "created-at": FIXTURE_EPOCH_MS + 6_000,
        "steps": steps,
    })
}
