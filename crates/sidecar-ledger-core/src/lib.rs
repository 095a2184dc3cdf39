//! # Sidecar Ledger Core
//!
//! Pure primitives for the sidecar ledger: records, events, validation, and
//! chain scoring.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over the ledger's data model.
//!
//! ## Key Types
//!
//! - [`Event`] - One submitted write attempt (envelope + payload map)
//! - [`Proposal`], [`Promotion`], [`Evidence`], [`Action`], [`Fact`],
//!   [`BridgeTriple`] - The record entities
//! - [`Chain`] / [`ChainStep`] - Ordered hops justifying a derived claim
//! - [`FieldError`] - One structured objection to a write
//!
//! ## Validation
//!
//! [`validate`] inspects an event's payload shape and gathers every
//! objection at once. Referential checks against stored entities belong to
//! the ledger crate's boundary pass.

pub mod chain;
pub mod error;
pub mod event;
pub mod record;
pub mod softness;
pub mod types;
pub mod validation;

pub use chain::{Chain, ChainStep, ShiftGate, StepType};
pub use error::{DecodeError, ErrorKind, FieldError};
pub use event::{Event, EventType};
pub use record::{
    Action, BridgeTriple, Evidence, EvidenceTarget, Fact, Promotion, Proposal, ProposalStatus,
    TargetType, BRIDGE_TRIPLE_KIND,
};
pub use softness::{score_steps, step_weight, Softness};
pub use types::{EntityId, Timestamp};
pub use validation::{validate, validate_bridge_triple};
