//! Softness accounting: the fixed per-hop trust weights.
//!
//! Lower is harder. Arrows are grounded structure, bridges are warranted
//! sense-shifts, bare proposals are still fuzzy.

use serde::{Deserialize, Serialize};

use crate::chain::{ChainStep, StepType};

pub const ARROW_WEIGHT: f64 = 0.0;
pub const BRIDGE_WEIGHT: f64 = 0.5;
pub const PROPOSAL_WEIGHT: f64 = 1.0;

/// Weight of a single hop.
pub fn step_weight(step_type: StepType) -> f64 {
    match step_type {
        StepType::Arrow => ARROW_WEIGHT,
        StepType::Bridge => BRIDGE_WEIGHT,
        StepType::Proposal => PROPOSAL_WEIGHT,
    }
}

/// Softness summary of a whole chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Softness {
    pub total: f64,
    pub average: f64,
    /// Mirrors the input step order.
    pub per_step: Vec<f64>,
}

/// Score a sequence of hops.
///
/// Validation already forbids empty chains; the zero-step branch is kept so
/// the function stays total.
pub fn score_steps(steps: &[ChainStep]) -> Softness {
    let per_step: Vec<f64> = steps.iter().map(|s| step_weight(s.step_type)).collect();
    let total: f64 = per_step.iter().sum();
    let average = if per_step.is_empty() {
        0.0
    } else {
        total / per_step.len() as f64
    };
    Softness {
        total,
        average,
        per_step,
    }
}
