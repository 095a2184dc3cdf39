//! # Sidecar Ledger Testkit
//!
//! Testing utilities for the sidecar ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ledger wired to a temp-dir audit file, a fixed clock,
//!   and sequential ids, plus well-formed payload builders
//! - **Generators**: proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use sidecar_ledger_testkit::fixtures::{proposal_payload, LedgerFixture};
//!
//! let fixture = LedgerFixture::new();
//! let id = fixture.ledger.record_proposal(proposal_payload("p-1")).unwrap();
//! assert_eq!(id, "p-1");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    action_payload, bridge_payload, chain_payload, evidence_payload, fact_payload,
    promotion_payload, proposal_payload, FixedClock, LedgerFixture, SeqIdGen, FIXTURE_EPOCH_MS,
};
