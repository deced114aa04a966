// idis-core/src/validators/muhasabah.rs
// ============================================================================
// Module: IDIS Muḥāsabah Validator
// Description: Fail-closed checks on agent self-check records.
// Purpose: Reject debate outputs that skip the accountability record.
// Dependencies: crate::core::{debate, decimal}
// ============================================================================

//! ## Overview
//! Every debate agent output must carry a Muḥāsabah record. The gate rejects
//! missing records, factual outputs without supported claims, recommendations
//! without falsifiability tests, and overconfident outputs that acknowledge
//! no uncertainty. Rejections are deterministic and carry the exact reason
//! code so the orchestrator can halt with a typed error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::debate::AgentOutput;
use crate::core::decimal::Dec;
use crate::validators::ValidationIssue;
use crate::validators::ValidationResult;

// ============================================================================
// SECTION: Rejection Reasons
// ============================================================================

/// Closed set of gate rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateRejectionReason {
    /// The output carried no Muḥāsabah record.
    MissingMuhasabah,
    /// The record failed a consistency check.
    InvalidMuhasabah,
    /// A factual sentence carried no claim or calc reference.
    NoFreeFactsViolation,
    /// The output itself was absent.
    MissingOutput,
}

impl GateRejectionReason {
    /// Returns the stable reason code string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingMuhasabah => "MISSING_MUHASABAH",
            Self::InvalidMuhasabah => "INVALID_MUHASABAH",
            Self::NoFreeFactsViolation => "NO_FREE_FACTS_VIOLATION",
            Self::MissingOutput => "MISSING_OUTPUT",
        }
    }
}

impl std::fmt::Display for GateRejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Overconfidence threshold above which uncertainties are mandatory.
fn overconfidence_threshold() -> Dec {
    Dec::parse("0.80").unwrap_or_else(|_| Dec::zero())
}

/// Validates the Muḥāsabah record attached to an agent output.
///
/// Returns a failing result with reason-coded issues; callers map the first
/// issue code back to a [`GateRejectionReason`].
#[must_use]
pub fn validate_muhasabah(output: &AgentOutput) -> ValidationResult {
    let Some(record) = &output.muhasabah else {
        return ValidationResult::fail(vec![ValidationIssue::new(
            "MISSING_MUHASABAH",
            "agent output missing required muhasabah record",
            "$.muhasabah",
        )]);
    };

    let mut errors = Vec::new();

    if record.confidence < Dec::zero() || record.confidence > Dec::from_i64(1) {
        errors.push(ValidationIssue::new(
            "INVALID_CONFIDENCE",
            format!("confidence {} outside [0, 1]", record.confidence),
            "$.muhasabah.confidence",
        ));
    }

    let is_subjective = record.is_subjective || output.content.is_subjective;
    if !is_subjective && record.supported_claim_ids.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_CLAIM_REFS",
            "factual output must reference at least one supported claim",
            "$.muhasabah.supported_claim_ids",
        ));
    }

    if record.recommendation.is_some() && record.falsifiability_tests.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_FALSIFIABILITY",
            "a recommendation requires at least one falsifiability test",
            "$.muhasabah.falsifiability_tests",
        ));
    }

    if record.confidence > overconfidence_threshold() && record.uncertainties.is_empty() {
        errors.push(ValidationIssue::new(
            "OVERCONFIDENT",
            format!(
                "confidence {} above 0.80 with no acknowledged uncertainties",
                record.confidence
            ),
            "$.muhasabah.uncertainties",
        ));
    }

    // No-Free-Facts at the output boundary: factual narrative text must be
    // backed by at least one referenced claim or calc.
    if !is_subjective
        && !output.content.text.is_empty()
        && record.supported_claim_ids.is_empty()
        && record.supported_calc_ids.is_empty()
    {
        errors.push(ValidationIssue::new(
            "NO_FREE_FACTS_VIOLATION",
            "factual output content has no referenced claim or calc",
            "$.content.text",
        ));
    }

    if errors.is_empty() {
        ValidationResult::success()
    } else {
        ValidationResult::fail(errors)
    }
}
