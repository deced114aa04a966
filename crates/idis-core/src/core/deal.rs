// idis-core/src/core/deal.rs
// ============================================================================
// Module: IDIS Deal Model
// Description: Investment-opportunity records scoped to a tenant.
// Purpose: Provide the root entity every claim, run, and deliverable hangs off.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A deal is the root aggregate of a diligence engagement. Every other entity
//! carries the deal's `tenant_id`; cross-tenant reads of a deal return
//! not-found rather than a permission error so no existence oracle exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DealId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Deal Enums
// ============================================================================

/// Funding stage of the opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStage {
    /// Pre-seed round.
    PreSeed,
    /// Seed round.
    Seed,
    /// Series A.
    SeriesA,
    /// Series B.
    SeriesB,
    /// Growth or later round.
    Growth,
}

/// Workflow status of the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// Newly created, awaiting documents.
    Open,
    /// Screening in progress.
    Screening,
    /// Full diligence in progress.
    Diligence,
    /// Passed on by the committee.
    Passed,
    /// Investment approved.
    Approved,
    /// Archived.
    Archived,
}

// ============================================================================
// SECTION: Deal Record
// ============================================================================

/// An investment opportunity under diligence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal identifier.
    pub deal_id: DealId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Target company name.
    pub company_name: String,
    /// Funding stage.
    pub stage: DealStage,
    /// Workflow status.
    pub status: DealStatus,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
    /// Free-form tags, kept sorted and unique.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}
