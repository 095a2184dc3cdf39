//! # Sidecar Ledger
//!
//! A validated, append-only, event-sourced ledger for the lifecycle of
//! fuzzy-to-authoritative knowledge: proposals, promotions, evidence, facts
//! (including bridge triples), actions, and justification chains.
//!
//! Every write is validated against a strict shape, then either committed to
//! the in-memory store and mirrored to an append-only audit file, or rejected
//! and recorded in the audit as a failure. Records are never mutated;
//! corrections are new records.
//!
//! ## Core Invariants
//!
//! 1. **Append-only**: a stored id is never replaced; a retry is an
//!    append-only violation.
//! 2. **Referential**: promotions point at stored proposals, evidence at
//!    stored targets, facts at stored promotions, chain steps at stored
//!    proposals and bridge triples.
//! 3. **Audit completeness**: every attempt, successful or not, produces a
//!    durable audit record.
//! 4. **Sense-shift gate**: a shift hop commits only with a recognized
//!    warrant.
//! 5. **Softness accounting**: arrow 0.0, bridge 0.5, proposal 1.0; totals
//!    are sums, averages are totals over counts.
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use sidecar_ledger::Ledger;
//!
//! let ledger = Ledger::open_default()?;
//! let id = ledger.record_proposal(json!({
//!     "id": "p-1",
//!     "kind": "claim",
//!     "status": "pending",
//!     "score": 0.42,
//!     "method": "ann",
//!     "evidence": [],
//! }))?;
//! assert_eq!(ledger.timeline(id.as_str()).len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod clock;
pub mod error;
pub mod id;
pub mod ledger;
pub mod timeline;

pub use audit::{
    default_audit_path, read_audit_log, AuditEntry, AuditType, FileAuditSink, AUDIT_FILE_NAME,
    DEFAULT_LOG_ROOT, LOG_ROOT_ENV,
};
pub use clock::{Clock, SystemClock};
pub use error::{LedgerError, Result};
pub use id::{IdGen, RandomIdGen};
pub use ledger::{BuiltChain, Ledger};
pub use timeline::{touches, Outcome, TimelineEvent};
