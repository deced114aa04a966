// idis-core/src/runtime/grader/tiers.rs
// ============================================================================
// Module: IDIS Source Tiers
// Description: Source tier assignment and tier-derived grade policy.
// Purpose: Map evidence provenance onto the T1–T5 authority ladder.
// Dependencies: crate::core::{claim, decimal, evidence}
// ============================================================================

//! ## Overview
//! The primary source of a Sanad is assigned to a tier from T1
//! (authoritative) down to T5 (hearsay). The tier fixes the base grade,
//! carries a consensus weight for anomaly detection, and gates admissibility:
//! a HIGH or CRITICAL materiality claim resting on a sub-T3 source is capped
//! at grade C. Missing sources assign T5 (fail-closed).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Grade;
use crate::core::claim::Materiality;
use crate::core::decimal::Dec;
use crate::core::evidence::EvidenceItem;
use crate::core::evidence::SourceType;

// ============================================================================
// SECTION: Tiers
// ============================================================================

/// Source authority tiers, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceTier {
    /// Authoritative records (regulatory, audited, bank, court).
    T1,
    /// Contractual and management documentation.
    T2,
    /// Third-party and reference sources.
    T3,
    /// Company-interested or journalistic sources.
    T4,
    /// Hearsay and unknown provenance.
    T5,
}

/// How a tier's sources may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierUsage {
    /// May carry a claim on its own.
    Primary,
    /// May only corroborate stronger sources.
    SupportOnly,
}

impl SourceTier {
    /// Returns the base grade for this tier.
    #[must_use]
    pub const fn base_grade(self) -> Grade {
        match self {
            Self::T1 => Grade::A,
            Self::T2 => Grade::B,
            Self::T3 | Self::T4 => Grade::C,
            Self::T5 => Grade::D,
        }
    }

    /// Returns the consensus weight of this tier.
    #[must_use]
    pub fn weight(self) -> Dec {
        let literal = match self {
            Self::T1 => "1.0",
            Self::T2 => "0.8",
            Self::T3 => "0.6",
            Self::T4 => "0.4",
            Self::T5 => "0.2",
        };
        Dec::parse(literal).unwrap_or_else(|_| Dec::zero())
    }

    /// Returns the usage class of this tier.
    #[must_use]
    pub const fn usage(self) -> TierUsage {
        match self {
            Self::T1 | Self::T2 | Self::T3 => TierUsage::Primary,
            Self::T4 | Self::T5 => TierUsage::SupportOnly,
        }
    }

    /// Returns the stable tier name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
            Self::T3 => "T3",
            Self::T4 => "T4",
            Self::T5 => "T5",
        }
    }
}

// ============================================================================
// SECTION: Assignment
// ============================================================================

/// Assigns a tier to a source; a missing source assigns T5.
#[must_use]
pub fn assign_source_tier(source: Option<&EvidenceItem>) -> SourceTier {
    let Some(source) = source else {
        return SourceTier::T5;
    };
    match source.source_type {
        SourceType::RegulatoryFiling
        | SourceType::AuditedFinancials
        | SourceType::BankStatement
        | SourceType::CourtRecord => SourceTier::T1,
        SourceType::ContractualDocument
        | SourceType::ManagementAccounts
        | SourceType::DataRoomDocument => SourceTier::T2,
        SourceType::ThirdPartyDatabase
        | SourceType::IndustryReport
        | SourceType::CustomerReference => SourceTier::T3,
        SourceType::PressArticle
        | SourceType::CompanyMarketing
        | SourceType::FounderStatement => SourceTier::T4,
        SourceType::AnonymousTip | SourceType::Unknown => SourceTier::T5,
    }
}

/// Checks tier admissibility against claim materiality.
///
/// HIGH and CRITICAL claims resting on a sub-T3 primary source are
/// inadmissible at full grade and capped at C.
#[must_use]
pub fn check_tier_admissibility(tier: SourceTier, materiality: Materiality) -> bool {
    if materiality >= Materiality::High {
        return tier <= SourceTier::T3;
    }
    true
}
