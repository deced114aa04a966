// idis-core/src/validators/extraction_gate.rs
// ============================================================================
// Module: IDIS Extraction Confidence Gate
// Description: Hard gate between extraction output and deterministic calcs.
// Purpose: Block low-confidence values from reaching the calc engine.
// Dependencies: crate::core::{decimal, evidence, identifiers}
// ============================================================================

//! ## Overview
//! Low-confidence extracted values must not feed deterministic engines
//! without human verification. The gate blocks any input whose extraction
//! confidence is below 0.95 or whose Dabt score is below 0.90, and blocks
//! missing or out-of-range values outright. Human verification (direct flag
//! or `HUMAN_VERIFIED`/`DUAL_VERIFIED` method) bypasses all checks. A single
//! blocked input aborts the whole calculation; there is no partial pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::claim::Grade;
use crate::core::decimal::Dec;
use crate::core::evidence::VerificationMethod;
use crate::core::identifiers::ClaimId;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Minimum extraction confidence admitted without human verification.
static CONFIDENCE_THRESHOLD: LazyLock<Dec> =
    LazyLock::new(|| Dec::parse("0.95").unwrap_or_else(|_| Dec::zero()));

/// Minimum Dabt score admitted without human verification.
static DHABT_THRESHOLD: LazyLock<Dec> =
    LazyLock::new(|| Dec::parse("0.90").unwrap_or_else(|_| Dec::zero()));

// ============================================================================
// SECTION: Gate Input
// ============================================================================

/// One calc input presented to the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionGateInput {
    /// Claim the value was extracted from.
    pub claim_id: ClaimId,
    /// Sanad grade of the claim.
    pub grade: Grade,
    /// True when the input is material to the calc grade.
    pub is_material: bool,
    /// Extraction confidence in `[0, 1]`, absent when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_confidence: Option<Dec>,
    /// Dabt score in `[0, 1]`, absent when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhabt_score: Option<Dec>,
    /// Direct human-verification flag.
    #[serde(default)]
    pub is_human_verified: bool,
    /// Verification method.
    pub verification_method: VerificationMethod,
}

impl ExtractionGateInput {
    /// Returns true when human verification bypasses the gate.
    #[must_use]
    pub const fn is_human_verified(&self) -> bool {
        self.is_human_verified || self.verification_method.is_human()
    }
}

// ============================================================================
// SECTION: Gate Decision
// ============================================================================

/// Why the gate blocked an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    /// Confidence below threshold.
    LowConfidence,
    /// Dabt below threshold.
    LowDhabt,
    /// Confidence missing.
    MissingConfidence,
    /// Dabt missing.
    MissingDhabt,
    /// Confidence outside `[0, 1]`.
    InvalidConfidence,
    /// Dabt outside `[0, 1]`.
    InvalidDhabt,
}

/// Per-input gate decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionGateDecision {
    /// True when the input may feed a calculation.
    pub allowed: bool,
    /// Block reason, when blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
    /// Evaluated claim.
    pub claim_id: ClaimId,
    /// Confidence evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_confidence: Option<Dec>,
    /// Dabt evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhabt_score: Option<Dec>,
    /// True when human verification bypassed the checks.
    pub bypassed_by_human_verification: bool,
}

/// Typed failure raised when any input is blocked.
#[derive(Debug, Error)]
#[error("extraction gate blocked {} input(s) for calc '{calc_type}'", blocked.len())]
pub struct ExtractionGateBlockedError {
    /// Decisions for every blocked input.
    pub blocked: Vec<ExtractionGateDecision>,
    /// Calc type the inputs were intended for.
    pub calc_type: String,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Checks a score is present and inside `[0, 1]`.
fn score_in_range(score: &Dec) -> bool {
    score >= &Dec::zero() && score <= &Dec::from_i64(1)
}

/// Evaluates the gate for a single input.
#[must_use]
pub fn evaluate_extraction_gate(input: &ExtractionGateInput) -> ExtractionGateDecision {
    let blocked = |reason: BlockReason| ExtractionGateDecision {
        allowed: false,
        reason: Some(reason),
        claim_id: input.claim_id.clone(),
        extraction_confidence: input.extraction_confidence.clone(),
        dhabt_score: input.dhabt_score.clone(),
        bypassed_by_human_verification: false,
    };

    if input.is_human_verified() {
        return ExtractionGateDecision {
            allowed: true,
            reason: None,
            claim_id: input.claim_id.clone(),
            extraction_confidence: input.extraction_confidence.clone(),
            dhabt_score: input.dhabt_score.clone(),
            bypassed_by_human_verification: true,
        };
    }

    let Some(confidence) = &input.extraction_confidence else {
        return blocked(BlockReason::MissingConfidence);
    };
    if !score_in_range(confidence) {
        return blocked(BlockReason::InvalidConfidence);
    }
    if confidence < &*CONFIDENCE_THRESHOLD {
        return blocked(BlockReason::LowConfidence);
    }

    let Some(dhabt) = &input.dhabt_score else {
        return blocked(BlockReason::MissingDhabt);
    };
    if !score_in_range(dhabt) {
        return blocked(BlockReason::InvalidDhabt);
    }
    if dhabt < &*DHABT_THRESHOLD {
        return blocked(BlockReason::LowDhabt);
    }

    ExtractionGateDecision {
        allowed: true,
        reason: None,
        claim_id: input.claim_id.clone(),
        extraction_confidence: input.extraction_confidence.clone(),
        dhabt_score: input.dhabt_score.clone(),
        bypassed_by_human_verification: false,
    }
}

/// Enforces the gate over a batch of inputs.
///
/// # Errors
///
/// Returns [`ExtractionGateBlockedError`] listing every blocked input when
/// at least one input fails the gate.
pub fn enforce_extraction_gate(
    inputs: &[ExtractionGateInput],
    calc_type: &str,
) -> Result<(), ExtractionGateBlockedError> {
    let blocked: Vec<ExtractionGateDecision> = inputs
        .iter()
        .map(evaluate_extraction_gate)
        .filter(|decision| !decision.allowed)
        .collect();
    if blocked.is_empty() {
        Ok(())
    } else {
        Err(ExtractionGateBlockedError {
            blocked,
            calc_type: calc_type.to_string(),
        })
    }
}
