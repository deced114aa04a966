// idis-core/src/core/defect.rs
// ============================================================================
// Module: IDIS Defect Model
// Description: Typed faults discovered in evidence chains.
// Purpose: Provide the defect catalogue with fixed severity and cures.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Defects are typed faults discovered in a Sanad. The catalogue is closed
//! and every type carries a fixed severity: FATAL defects force grade D on
//! the affected claim, MAJOR defects downgrade, MINOR defects annotate.
//! Waiving or curing a defect requires an actor and a non-empty reason, and
//! both transitions are HIGH-severity audit events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DefectId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Defect Enums
// ============================================================================

/// Closed catalogue of defect types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectType {
    /// The transmission chain is broken.
    BrokenChain,
    /// A source concealed material information.
    Concealment,
    /// The chain supports itself circularly.
    Circularity,
    /// A link in the chain is missing.
    MissingLink,
    /// Timestamps violate causality.
    ChronoImpossible,
    /// A chain was grafted onto a foreign origin.
    ChainGrafting,
    /// Sources are mutually inconsistent.
    Inconsistency,
    /// The source cannot be identified.
    UnknownSource,
    /// A weaker source contradicts stronger sources.
    AnomalyVsStrongerSources,
    /// The claim is implausible on its face.
    Implausibility,
    /// The evidence is stale.
    Staleness,
    /// Units disagree between sources.
    UnitMismatch,
    /// Time windows disagree between sources.
    TimeWindowMismatch,
    /// The claim drifted from the cited scope.
    ScopeDrift,
}

/// Defect severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectSeverity {
    /// Annotation only.
    Minor,
    /// Downgrades the claim grade.
    Major,
    /// Forces grade D.
    Fatal,
}

impl DefectType {
    /// Returns the fixed severity of this defect type.
    #[must_use]
    pub const fn severity(self) -> DefectSeverity {
        match self {
            Self::BrokenChain
            | Self::Concealment
            | Self::Circularity
            | Self::MissingLink
            | Self::ChronoImpossible
            | Self::ChainGrafting => DefectSeverity::Fatal,
            Self::Inconsistency
            | Self::UnknownSource
            | Self::AnomalyVsStrongerSources
            | Self::Implausibility => DefectSeverity::Major,
            Self::Staleness | Self::UnitMismatch | Self::TimeWindowMismatch | Self::ScopeDrift => {
                DefectSeverity::Minor
            }
        }
    }
}

/// Remediation protocol for a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CureProtocol {
    /// Request the primary source document.
    RequestSource,
    /// Require a re-audit of the chain.
    RequireReaudit,
    /// Escalate to human arbitration.
    HumanArbitration,
    /// Rebuild the chain from roots.
    ReconstructChain,
    /// Discard the claim entirely.
    DiscardClaim,
}

/// Lifecycle status of a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectStatus {
    /// Outstanding.
    Open,
    /// Waived with a recorded reason.
    Waived,
    /// Cured with a recorded reason.
    Cured,
}

// ============================================================================
// SECTION: Defect Record
// ============================================================================

/// A typed fault discovered in a Sanad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    /// Defect identifier.
    pub defect_id: DefectId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Affected claim.
    pub claim_id: ClaimId,
    /// Affected sanad.
    pub sanad_id: SanadId,
    /// Defect type from the closed catalogue.
    pub defect_type: DefectType,
    /// Severity, fixed by the type.
    pub severity: DefectSeverity,
    /// Remediation protocol.
    pub cure_protocol: CureProtocol,
    /// Lifecycle status.
    pub status: DefectStatus,
    /// Human-readable description.
    pub description: String,
    /// Actor who waived or cured the defect, when resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ActorId>,
    /// Reason recorded at waive or cure time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl Defect {
    /// Builds an open defect with severity derived from the type.
    #[must_use]
    pub fn open(
        defect_id: DefectId,
        tenant_id: TenantId,
        claim_id: ClaimId,
        sanad_id: SanadId,
        defect_type: DefectType,
        cure_protocol: CureProtocol,
        description: String,
        now: Timestamp,
    ) -> Self {
        Self {
            defect_id,
            tenant_id,
            claim_id,
            sanad_id,
            defect_type,
            severity: defect_type.severity(),
            cure_protocol,
            status: DefectStatus::Open,
            description,
            resolved_by: None,
            resolution_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
