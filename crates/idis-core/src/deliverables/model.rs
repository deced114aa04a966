// idis-core/src/deliverables/model.rs
// ============================================================================
// Module: IDIS Deliverable Model
// Description: Sections, facts, and the audit appendix.
// Purpose: Carry traceability from every factual sentence to its sources.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! A deliverable has ordered sections; each section has ordered facts; each
//! fact carries its claim and calc references and its factual/subjective
//! flags. The audit appendix aggregates every reference in the deliverable,
//! sorted and deduplicated, so a reader can audit any statement back to a
//! registered claim or calculation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::DeliverableId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Deliverable Enums
// ============================================================================

/// Deliverable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverableType {
    /// Investment-committee memo.
    IcMemo,
    /// Screening snapshot.
    ScreeningSnapshot,
    /// Claim-verification truth dashboard.
    TruthDashboard,
}

/// Reference kinds in the audit appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    /// A claim reference.
    Claim,
    /// A calculation reference.
    Calc,
}

// ============================================================================
// SECTION: Facts and Sections
// ============================================================================

/// One statement inside a section.
///
/// # Invariants
/// - `is_factual` facts carry at least one claim or calc reference before
///   export; `is_subjective` does not bypass that check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Statement text.
    pub text: String,
    /// Supporting claim references.
    #[serde(default)]
    pub claim_refs: Vec<ClaimId>,
    /// Supporting calculation references.
    #[serde(default)]
    pub calc_refs: Vec<CalcId>,
    /// True when the statement asserts a verifiable fact.
    pub is_factual: bool,
    /// True when the statement is opinion.
    pub is_subjective: bool,
}

/// One ordered section of a deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section title.
    pub title: String,
    /// Ordered facts.
    pub facts: Vec<Fact>,
}

/// One entry of the audit appendix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditRef {
    /// Reference kind.
    pub ref_type: RefType,
    /// Referenced identifier.
    pub ref_id: String,
}

// ============================================================================
// SECTION: Deliverable
// ============================================================================

/// A complete deliverable ready for validation and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    /// Deliverable identifier.
    pub deliverable_id: DeliverableId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent deal.
    pub deal_id: DealId,
    /// Deliverable kind.
    pub deliverable_type: DeliverableType,
    /// Document title.
    pub title: String,
    /// Generation timestamp string, caller-supplied.
    pub generated_at: String,
    /// Ordered sections.
    pub sections: Vec<Section>,
    /// Audit appendix: every reference in the deliverable, sorted unique.
    pub audit_appendix: Vec<AuditRef>,
}

impl Deliverable {
    /// Rebuilds the audit appendix from the current sections.
    pub fn rebuild_audit_appendix(&mut self) {
        let mut refs: Vec<AuditRef> = Vec::new();
        for section in &self.sections {
            for fact in &section.facts {
                for claim in &fact.claim_refs {
                    refs.push(AuditRef {
                        ref_type: RefType::Claim,
                        ref_id: claim.to_string(),
                    });
                }
                for calc in &fact.calc_refs {
                    refs.push(AuditRef {
                        ref_type: RefType::Calc,
                        ref_id: calc.to_string(),
                    });
                }
            }
        }
        refs.sort();
        refs.dedup();
        self.audit_appendix = refs;
    }
}
