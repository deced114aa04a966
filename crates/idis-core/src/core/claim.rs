// idis-core/src/core/claim.rs
// ============================================================================
// Module: IDIS Claim Model
// Description: Extracted propositions with grades, verdicts, and actions.
// Purpose: Provide the typed claim record every engine consumes.
// Dependencies: serde, crate::core::{decimal, identifiers, value_struct}
// ============================================================================

//! ## Overview
//! A claim is a proposition extracted from document spans, typed by class and
//! graded A through D by the Sanad grader. Claims start at grade D and only
//! improve when the evidence chain supports it. Factual, non-subjective
//! claims must reference at least one evidence item or calculation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::decimal::Dec;
use crate::core::document::DocumentRef;
use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::SpanId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::core::value_struct::ValueStruct;

// ============================================================================
// SECTION: Grades
// ============================================================================

/// Evidence grade ladder shared by claims, sources, sanads, and calcs.
///
/// # Invariants
/// - `A` is the strongest grade; `D` the weakest.
/// - Ordering is by strength: `A < B < C < D` in rank terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Strong, independently corroborated evidence.
    A,
    /// Good evidence with minor gaps.
    B,
    /// Weak or partially supported evidence.
    C,
    /// Unsupported or defective evidence.
    D,
}

impl Grade {
    /// Returns the worse (weaker) of two grades.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if self >= other { self } else { other }
    }

    /// Returns the worst grade in a non-empty iterator, or `None` when empty.
    #[must_use]
    pub fn min_grade<I: IntoIterator<Item = Self>>(grades: I) -> Option<Self> {
        grades.into_iter().max()
    }

    /// Downgrades by one level, saturating at `D`.
    #[must_use]
    pub const fn downgrade(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::C,
            Self::C | Self::D => Self::D,
        }
    }

    /// Upgrades by one level, saturating at `A`.
    #[must_use]
    pub const fn upgrade(self) -> Self {
        match self {
            Self::A | Self::B => Self::A,
            Self::C => Self::B,
            Self::D => Self::C,
        }
    }

    /// Applies a cap: the result is never better than `cap`.
    #[must_use]
    pub fn capped_at(self, cap: Self) -> Self {
        self.worst(cap)
    }

    /// Returns the grade letter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

// ============================================================================
// SECTION: Claim Enums
// ============================================================================

/// Closed classification of claim subject matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimClass {
    /// Revenue, margin, burn, and other financials.
    Financial,
    /// Customer and usage traction.
    Traction,
    /// Market sizing.
    MarketSize,
    /// Competitive landscape.
    Competition,
    /// Team composition and history.
    Team,
    /// Legal terms and cap-table facts.
    LegalTerms,
    /// Technology and product facts.
    Technical,
    /// Anything else.
    Other,
}

/// Verification verdict on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimVerdict {
    /// Not yet verified.
    Unverified,
    /// Verified against evidence.
    Verified,
    /// Stated value exceeds what evidence supports.
    Inflated,
    /// Evidence contradicts the claim.
    Contradicted,
    /// Opinion rather than verifiable fact.
    Subjective,
}

/// Follow-up action attached to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimAction {
    /// No action required.
    None,
    /// Flag for analyst attention.
    Flag,
    /// Requires verification work.
    Verify,
    /// Requires a human gate before use.
    HumanGate,
    /// Raised as a red flag on the deal.
    RedFlag,
}

/// Materiality of a claim to the investment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Materiality {
    /// Immaterial detail.
    Low,
    /// Moderately material.
    Medium,
    /// Material to the thesis.
    High,
    /// Decision-critical.
    Critical,
}

// ============================================================================
// SECTION: Claim Record
// ============================================================================

/// A proposition extracted from document spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim identifier.
    pub claim_id: ClaimId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent deal.
    pub deal_id: DealId,
    /// Subject-matter class.
    pub claim_class: ClaimClass,
    /// Claim text as extracted.
    pub text: String,
    /// Structured value, when one was extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueStruct>,
    /// Current grade; new claims start at `D`.
    pub claim_grade: Grade,
    /// Verification verdict.
    pub claim_verdict: ClaimVerdict,
    /// Follow-up action.
    pub claim_action: ClaimAction,
    /// Materiality to the decision.
    pub materiality: Materiality,
    /// Primary span the claim was extracted from.
    pub primary_span_id: SpanId,
    /// Document (version) the claim cites, for drift detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_document: Option<DocumentRef>,
    /// Extractor confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_confidence: Option<Dec>,
    /// Precision (Dabt) score in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhabt_score: Option<Dec>,
    /// True when the claim asserts a verifiable fact.
    pub is_factual: bool,
    /// True when the claim is an opinion.
    pub is_subjective: bool,
    /// Supporting evidence references.
    #[serde(default)]
    pub evidence_ids: Vec<EvidenceId>,
    /// Supporting calculation references.
    #[serde(default)]
    pub calc_ids: Vec<CalcId>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl Claim {
    /// Returns true when the claim requires at least one supporting reference.
    #[must_use]
    pub const fn requires_support(&self) -> bool {
        self.is_factual && !self.is_subjective
    }

    /// Returns true when the support invariant holds.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !self.requires_support() || !self.evidence_ids.is_empty() || !self.calc_ids.is_empty()
    }
}
