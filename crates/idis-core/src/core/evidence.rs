// idis-core/src/core/evidence.rs
// ============================================================================
// Module: IDIS Evidence Model
// Description: Evidence items supporting claims, with source typing and COI.
// Purpose: Provide the graded source records the Sanad grader consumes.
// Dependencies: serde, crate::core::{claim, identifiers}
// ============================================================================

//! ## Overview
//! An evidence item supports a claim and anchors one root of its Sanad chain.
//! Source typing drives tier assignment (T1 authoritative through T5
//! hearsay), the independence cluster drives Tawatur corroboration counting,
//! and the conflict-of-interest disclosure drives COI caps and defects.
//! Evidence inputs are untrusted until graded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Grade;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::SpanId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Source Typing
// ============================================================================

/// Closed classification of evidence provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Regulatory or government filing.
    RegulatoryFiling,
    /// Audited financial statements.
    AuditedFinancials,
    /// Bank or payment-processor statement.
    BankStatement,
    /// Court or registry record.
    CourtRecord,
    /// Executed contract or legal agreement.
    ContractualDocument,
    /// Management accounts prepared by the company.
    ManagementAccounts,
    /// Document provided through the deal data room.
    DataRoomDocument,
    /// Third-party commercial database.
    ThirdPartyDatabase,
    /// Industry analyst report.
    IndustryReport,
    /// Customer reference call or survey.
    CustomerReference,
    /// Press article.
    PressArticle,
    /// Company marketing material.
    CompanyMarketing,
    /// Founder statement without documentation.
    FounderStatement,
    /// Anonymous or unattributable tip.
    AnonymousTip,
    /// Provenance unknown.
    Unknown,
}

/// Verification state of an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Not yet reviewed.
    Pending,
    /// Verified by a human or dual control.
    Verified,
    /// Verification attempted and failed.
    Failed,
}

/// How a value was verified, for the extraction gate bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    /// No verification performed.
    None,
    /// Verified by a human reviewer.
    HumanVerified,
    /// Verified by an automated system.
    SystemVerified,
    /// Verified independently by two reviewers.
    DualVerified,
}

impl VerificationMethod {
    /// Returns true when this method satisfies the human-verification bypass.
    #[must_use]
    pub const fn is_human(self) -> bool {
        matches!(self, Self::HumanVerified | Self::DualVerified)
    }
}

// ============================================================================
// SECTION: Conflict of Interest
// ============================================================================

/// Conflict-of-interest disclosure attached to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoiDisclosure {
    /// True when the source benefits from the claim being believed.
    pub self_serving: bool,
    /// True when the interest was disclosed up front.
    pub disclosed: bool,
}

// ============================================================================
// SECTION: Evidence Record
// ============================================================================

/// An item of evidence supporting a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Evidence identifier.
    pub evidence_id: EvidenceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Span the evidence was drawn from.
    pub source_span_id: SpanId,
    /// Provenance classification.
    pub source_type: SourceType,
    /// Grade assigned to the source itself.
    pub source_grade: Grade,
    /// Originating system name.
    pub source_system: String,
    /// Upstream origin identifier for provenance linkage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_origin_id: Option<String>,
    /// Independence cluster; sources sharing a cluster corroborate as one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub independence_cluster: Option<String>,
    /// Conflict-of-interest disclosure, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coi: Option<CoiDisclosure>,
    /// Observed value as extracted from this source, for anomaly checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<String>,
    /// Verification state.
    pub verification_status: VerificationStatus,
    /// Timestamp the evidence was captured.
    pub captured_at: Timestamp,
}
