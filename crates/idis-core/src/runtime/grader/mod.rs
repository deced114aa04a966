// idis-core/src/runtime/grader/mod.rs
// ============================================================================
// Module: IDIS Sanad Grader
// Description: Deterministic hierarchical grading of evidence chains.
// Purpose: Combine tiers, Dabt, Tawatur, I'lal, Shudhudh, and COI into A–D.
// Dependencies: crate::core, crate::runtime::grader::{tiers, dabt, tawatur, ilal, shudhudh, coi}
// ============================================================================

//! ## Overview
//! The grader is deterministic and fail-closed. Tier assignment fixes the
//! base grade; Dabt and COI can cap it; each MAJOR defect downgrades one
//! level; MUTAWATIR corroboration with no MAJOR defects upgrades one level;
//! any FATAL defect forces grade D outright. The result carries a fully
//! populated explanation so every grade is reproducible from its inputs.
//! There is no randomness anywhere in this path: chain nodes iterate by
//! `node_id`, sources by `evidence_id`, and every output list is sorted.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod coi;
pub mod dabt;
pub mod ilal;
pub mod shudhudh;
pub mod tawatur;
pub mod tiers;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Claim;
use crate::core::claim::Grade;
use crate::core::decimal::Dec;
use crate::core::defect::DefectSeverity;
use crate::core::document::Document;
use crate::core::evidence::EvidenceItem;
use crate::core::identifiers::EvidenceId;
use crate::core::sanad::CorroborationLevel;
use crate::core::sanad::Sanad;
use crate::runtime::grader::coi::CoiEvaluation;
use crate::runtime::grader::coi::coi_grade_cap;
use crate::runtime::grader::coi::collect_coi_defects;
use crate::runtime::grader::coi::evaluate_all_sources_coi;
use crate::runtime::grader::dabt::DabtScore;
use crate::runtime::grader::dabt::calculate_dabt_score;
use crate::runtime::grader::dabt::cap_threshold;
use crate::runtime::grader::dabt::extract_dabt_dimensions;
use crate::runtime::grader::ilal::IlalDefect;
use crate::runtime::grader::ilal::detect_all_ilal;
use crate::runtime::grader::shudhudh::ObservedValue;
use crate::runtime::grader::shudhudh::ShudhudhResult;
use crate::runtime::grader::shudhudh::detect_shudhudh;
use crate::runtime::grader::tawatur::TawaturResult;
use crate::runtime::grader::tawatur::assess_tawatur;
use crate::runtime::grader::tiers::SourceTier;
use crate::runtime::grader::tiers::assign_source_tier;
use crate::runtime::grader::tiers::check_tier_admissibility;

// ============================================================================
// SECTION: Grader Input
// ============================================================================

/// Everything the grader consumes for one sanad.
#[derive(Debug, Clone)]
pub struct GraderInput<'a> {
    /// The sanad under grading.
    pub sanad: &'a Sanad,
    /// Primary and corroborating sources.
    pub sources: &'a [EvidenceItem],
    /// Claim metadata, for admissibility and version drift.
    pub claim: Option<&'a Claim>,
    /// Full document set, for version drift.
    pub documents: &'a [Document],
    /// Known evidence ids, for chain-break reference checks.
    pub known_evidence_ids: Option<&'a BTreeSet<EvidenceId>>,
}

// ============================================================================
// SECTION: Result Model
// ============================================================================

/// A defect summarised for the grade explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectSummary {
    /// Stable defect code.
    pub code: String,
    /// Severity of the defect.
    pub severity: DefectSeverity,
    /// Human-readable description.
    pub description: String,
}

/// Full explanation of a grade calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeExplanation {
    /// Grade before modifiers.
    pub base_grade: Grade,
    /// Primary source tier.
    pub source_tier: String,
    /// Consensus weight of the tier.
    pub tier_weight: Dec,
    /// Weighted Dabt score.
    pub dabt_score: Dec,
    /// Dabt quality band.
    pub dabt_quality: String,
    /// Corroboration status.
    pub tawatur_status: CorroborationLevel,
    /// Independent chain count.
    pub independent_count: u32,
    /// Collusion risk fraction.
    pub collusion_risk: Dec,
    /// FATAL defects found.
    pub fatal_defects: Vec<DefectSummary>,
    /// MAJOR defects found.
    pub major_defects: Vec<DefectSummary>,
    /// MINOR defects found.
    pub minor_defects: Vec<DefectSummary>,
    /// Grade caps applied, in application order.
    pub grade_caps: Vec<Grade>,
    /// Upgrades applied.
    pub upgrades_applied: Vec<String>,
    /// Downgrades applied.
    pub downgrades_applied: Vec<String>,
    /// Final grade.
    pub final_grade: Grade,
    /// One-line summary.
    pub summary: String,
}

/// Complete grading result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanadGradeResult {
    /// Final grade.
    pub grade: Grade,
    /// Full explanation.
    pub explanation: GradeExplanation,
    /// Primary source tier.
    pub source_tier: SourceTier,
    /// Dabt score detail.
    pub dabt: DabtScore,
    /// Tawatur detail.
    pub tawatur: TawaturResult,
    /// Shudhudh detail, when at least two values were comparable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shudhudh: Option<ShudhudhResult>,
    /// I'lal defects found.
    pub ilal_defects: Vec<IlalDefect>,
    /// COI evaluations, in evidence order.
    pub coi_evaluations: Vec<CoiEvaluation>,
    /// All defects, FATAL first.
    pub all_defects: Vec<DefectSummary>,
}

// ============================================================================
// SECTION: Defect Collection
// ============================================================================

/// Buckets defect findings by severity.
fn collect_defect_summaries(
    ilal_defects: &[IlalDefect],
    coi_defects: &[coi::CoiDefect],
    shudhudh: Option<&ShudhudhResult>,
) -> (Vec<DefectSummary>, Vec<DefectSummary>, Vec<DefectSummary>) {
    let mut fatal = Vec::new();
    let mut major = Vec::new();
    let mut minor = Vec::new();

    let mut push = |code: String, severity: DefectSeverity, description: String| {
        let summary = DefectSummary {
            code,
            severity,
            description,
        };
        match severity {
            DefectSeverity::Fatal => fatal.push(summary),
            DefectSeverity::Major => major.push(summary),
            DefectSeverity::Minor => minor.push(summary),
        }
    };

    for defect in ilal_defects {
        push(defect.code.as_str().to_string(), defect.severity, defect.description.clone());
    }
    for defect in coi_defects {
        push(defect.code.clone(), defect.severity, defect.description.clone());
    }
    if let Some(result) = shudhudh
        && result.has_anomaly
        && let (Some(code), Some(severity)) = (&result.defect_code, result.severity)
    {
        push(
            code.clone(),
            severity,
            result.description.clone().unwrap_or_else(|| "Shudhudh anomaly detected".to_string()),
        );
    }

    (fatal, major, minor)
}

// ============================================================================
// SECTION: Grading
// ============================================================================

/// Grades a sanad deterministically.
#[allow(
    clippy::too_many_lines,
    reason = "Maintain a single linear flow so the grade derivation reads top to bottom."
)]
#[must_use]
pub fn grade_sanad(input: &GraderInput<'_>) -> SanadGradeResult {
    let mut sources: Vec<&EvidenceItem> = input.sources.iter().collect();
    sources.sort_by(|a, b| a.evidence_id.cmp(&b.evidence_id));

    let primary = input
        .sanad
        .primary_evidence_id
        .as_ref()
        .and_then(|id| sources.iter().find(|source| &source.evidence_id == id).copied())
        .or_else(|| sources.first().copied());

    let mut grade_caps: Vec<Grade> = Vec::new();
    let mut upgrades: Vec<String> = Vec::new();
    let mut downgrades: Vec<String> = Vec::new();

    // 1. Source tier fixes the base grade; admissibility can cap at C.
    let source_tier = assign_source_tier(primary);
    let base_grade = source_tier.base_grade();
    if let Some(claim) = input.claim
        && !check_tier_admissibility(source_tier, claim.materiality)
    {
        grade_caps.push(Grade::C);
    }

    // 2. Dabt below the threshold caps at B.
    let dimensions = extract_dabt_dimensions(input.sanad, input.claim, source_tier);
    let dabt = calculate_dabt_score(dimensions);
    if dabt.score < cap_threshold() {
        grade_caps.push(Grade::B);
    }

    // 3. Tawatur over independence clusters.
    let owned_sources: Vec<EvidenceItem> = sources.iter().map(|s| (*s).clone()).collect();
    let tawatur = assess_tawatur(&owned_sources);

    // 4. I'lal hidden defects.
    let ilal_defects = detect_all_ilal(
        input.sanad,
        input.claim,
        input.documents,
        input.known_evidence_ids,
    );

    // 5. Shudhudh across observed values, reconciliation first.
    let observed_pairs: Vec<(ObservedValue, EvidenceItem)> = sources
        .iter()
        .filter_map(|source| {
            source
                .observed_value
                .as_ref()
                .map(|raw| (ObservedValue::from_raw(raw), (*source).clone()))
        })
        .collect();
    let shudhudh = (observed_pairs.len() >= 2).then(|| detect_shudhudh(&observed_pairs));

    // 6. COI caps and defects.
    let coi_evaluations = evaluate_all_sources_coi(&owned_sources);
    let coi_defects = collect_coi_defects(&coi_evaluations);
    if let Some(cap) = coi_grade_cap(&coi_evaluations) {
        grade_caps.push(cap);
    }

    let (fatal, major, minor) =
        collect_defect_summaries(&ilal_defects, &coi_defects, shudhudh.as_ref());
    let mut all_defects = Vec::new();
    all_defects.extend(fatal.iter().cloned());
    all_defects.extend(major.iter().cloned());
    all_defects.extend(minor.iter().cloned());

    // 7. Combine deterministically.
    let (final_grade, summary) = if fatal.is_empty() {
        let mut grade = base_grade;
        for defect in &major {
            grade = grade.downgrade();
            downgrades.push(format!("MAJOR defect {}", defect.code));
        }
        if major.is_empty() && tawatur.status == CorroborationLevel::Mutawatir {
            grade = grade.upgrade();
            upgrades.push("MUTAWATIR corroboration upgrade".to_string());
        }
        for cap in &grade_caps {
            if grade < *cap {
                grade = *cap;
                downgrades.push(format!("Grade cap applied: {}", cap.as_str()));
            }
        }
        let summary = if downgrades.is_empty() {
            if upgrades.is_empty() {
                format!("Grade {} from base {}", grade.as_str(), base_grade.as_str())
            } else {
                format!("Grade {} with {} upgrade(s)", grade.as_str(), upgrades.len())
            }
        } else {
            format!("Grade {} after {} adjustment(s)", grade.as_str(), downgrades.len())
        };
        (grade, summary)
    } else {
        (
            Grade::D,
            format!("Grade D forced by {} FATAL defect(s): {}", fatal.len(), fatal[0].code),
        )
    };

    let explanation = GradeExplanation {
        base_grade,
        source_tier: source_tier.as_str().to_string(),
        tier_weight: source_tier.weight(),
        dabt_score: dabt.score.clone(),
        dabt_quality: dabt.quality_band.clone(),
        tawatur_status: tawatur.status,
        independent_count: tawatur.independent_count,
        collusion_risk: tawatur.collusion_risk.clone(),
        fatal_defects: fatal,
        major_defects: major,
        minor_defects: minor,
        grade_caps,
        upgrades_applied: upgrades,
        downgrades_applied: downgrades,
        final_grade,
        summary,
    };

    SanadGradeResult {
        grade: final_grade,
        explanation,
        source_tier,
        dabt,
        tawatur,
        shudhudh,
        ilal_defects,
        coi_evaluations,
        all_defects,
    }
}
