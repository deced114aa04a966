// idis-core/src/core/sanad.rs
// ============================================================================
// Module: IDIS Sanad Model
// Description: Evidence-chain DAG of transmission nodes supporting a claim.
// Purpose: Provide the chain structure the grader walks for hidden defects.
// Dependencies: serde, crate::core::{claim, identifiers, time}
// ============================================================================

//! ## Overview
//! A Sanad is the rooted DAG of transmission nodes supporting a claim: each
//! node is one step of extraction, calculation, or human verification.
//! Adjacency is stored as parent references on the nodes rather than pointer
//! links so chains serialize flat and lookups resolve through maps. The
//! computed grade, corroboration level, and rationale are attached after
//! grading.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Grade;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Corroboration
// ============================================================================

/// Independence-cluster corroboration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorroborationLevel {
    /// No corroborating chain.
    None,
    /// A single independent chain.
    Ahad1,
    /// Two independent chains.
    Ahad2,
    /// Three or more independent chains.
    Mutawatir,
}

// ============================================================================
// SECTION: Transmission Node
// ============================================================================

/// What a transmission step did to the information it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransmissionKind {
    /// Automated extraction from a span.
    Extraction,
    /// Deterministic calculation over upstream values.
    Calculation,
    /// Human verification step.
    HumanVerification,
}

/// One step of an evidence chain.
///
/// # Invariants
/// - `parent_id`, when set, must name another node in the same chain.
/// - `input_refs` and `output_refs` preserve caller ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionNode {
    /// Node identifier.
    pub node_id: NodeId,
    /// Step kind.
    pub kind: TransmissionKind,
    /// Parent node within the chain, absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Timestamp of the step; unparsable timestamps are stored as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Upstream origin identifier for grafting detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_origin_id: Option<String>,
    /// Evidence item this node draws on, when rooted in evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<EvidenceId>,
    /// Ordered input references.
    #[serde(default)]
    pub input_refs: Vec<String>,
    /// Ordered output references.
    #[serde(default)]
    pub output_refs: Vec<String>,
}

// ============================================================================
// SECTION: Sanad Record
// ============================================================================

/// The full evidentiary chain supporting a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanad {
    /// Sanad identifier.
    pub sanad_id: SanadId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Claim this chain supports.
    pub claim_id: ClaimId,
    /// Primary evidence item at the root of the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_evidence_id: Option<EvidenceId>,
    /// Transmission chain nodes.
    #[serde(default)]
    pub transmission_chain: Vec<TransmissionNode>,
    /// Computed grade.
    pub grade: Grade,
    /// Computed corroboration level.
    pub corroboration_level: CorroborationLevel,
    /// Number of independent chains observed.
    pub independent_chain_count: u32,
    /// Human-readable grading rationale.
    #[serde(default)]
    pub grade_rationale: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}
