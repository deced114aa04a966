// idis-core/src/runtime/grader/coi.rs
// ============================================================================
// Module: IDIS Conflict-of-Interest Evaluation
// Description: Source COI checks feeding grade caps and defects.
// Purpose: Cap disclosed self-interest at C, flag undisclosed as MAJOR.
// Dependencies: crate::core::{claim, defect, evidence}
// ============================================================================

//! ## Overview
//! Every source is evaluated for conflict of interest. A source that
//! benefits from the claim being believed and disclosed that interest caps
//! the grade at C; the same interest undisclosed raises a MAJOR defect.
//! Sources without a disclosure record are treated as undeclared and pass
//! only this check; tier assignment already penalises interested source
//! types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Grade;
use crate::core::defect::DefectSeverity;
use crate::core::evidence::EvidenceItem;
use crate::core::identifiers::EvidenceId;

// ============================================================================
// SECTION: Evaluation Model
// ============================================================================

/// COI finding for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoiEvaluation {
    /// Evaluated source.
    pub evidence_id: EvidenceId,
    /// True when the source is self-serving.
    pub self_serving: bool,
    /// True when the interest was disclosed.
    pub disclosed: bool,
}

/// COI defect raised for undisclosed interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoiDefect {
    /// Stable defect code.
    pub code: String,
    /// Severity of the finding.
    pub severity: DefectSeverity,
    /// Finding description.
    pub description: String,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates every source for COI, in `evidence_id` order.
#[must_use]
pub fn evaluate_all_sources_coi(sources: &[EvidenceItem]) -> Vec<CoiEvaluation> {
    let mut ordered: Vec<&EvidenceItem> = sources.iter().collect();
    ordered.sort_by(|a, b| a.evidence_id.cmp(&b.evidence_id));

    ordered
        .into_iter()
        .filter_map(|source| {
            source.coi.map(|coi| CoiEvaluation {
                evidence_id: source.evidence_id.clone(),
                self_serving: coi.self_serving,
                disclosed: coi.disclosed,
            })
        })
        .collect()
}

/// Collects MAJOR defects for undisclosed self-serving sources.
#[must_use]
pub fn collect_coi_defects(evaluations: &[CoiEvaluation]) -> Vec<CoiDefect> {
    evaluations
        .iter()
        .filter(|evaluation| evaluation.self_serving && !evaluation.disclosed)
        .map(|evaluation| CoiDefect {
            code: "COI_UNDISCLOSED".to_string(),
            severity: DefectSeverity::Major,
            description: format!(
                "Source {} has an undisclosed conflict of interest",
                evaluation.evidence_id
            ),
        })
        .collect()
}

/// Returns the grade cap implied by disclosed self-serving sources.
#[must_use]
pub fn coi_grade_cap(evaluations: &[CoiEvaluation]) -> Option<Grade> {
    evaluations
        .iter()
        .any(|evaluation| evaluation.self_serving && evaluation.disclosed)
        .then_some(Grade::C)
}
