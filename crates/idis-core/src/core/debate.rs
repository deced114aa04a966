// idis-core/src/core/debate.rs
// ============================================================================
// Module: IDIS Debate Model
// Description: Agent outputs and Muḥāsabah self-check records.
// Purpose: Provide the structures the debate gate validates fail-closed.
// Dependencies: serde, crate::core::{decimal, identifiers}
// ============================================================================

//! ## Overview
//! Debate agents (advocate, adversary, arbiter) produce outputs that must
//! each carry a Muḥāsabah record: the supported claim and calc references,
//! falsifiability tests, uncertainties, confidence, and failure modes. The
//! gate rejects any output whose record is missing or inconsistent; a
//! rejection halts the debate deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::decimal::Dec;
use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;

// ============================================================================
// SECTION: Agent Roles
// ============================================================================

/// Debate agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRole {
    /// Argues for the investment thesis.
    Advocate,
    /// Attacks the thesis.
    Adversary,
    /// Weighs both positions.
    Arbiter,
}

// ============================================================================
// SECTION: Muḥāsabah Record
// ============================================================================

/// Self-check record required on every agent output.
///
/// # Invariants
/// - `confidence` is in `[0, 1]`.
/// - Factual, non-subjective outputs carry at least one supported claim.
/// - A recommendation requires at least one falsifiability test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuhasabahRecord {
    /// Claims the output relies on.
    #[serde(default)]
    pub supported_claim_ids: Vec<ClaimId>,
    /// Calculations the output relies on.
    #[serde(default)]
    pub supported_calc_ids: Vec<CalcId>,
    /// Tests that would falsify the position.
    #[serde(default)]
    pub falsifiability_tests: Vec<String>,
    /// Acknowledged uncertainties.
    #[serde(default)]
    pub uncertainties: Vec<String>,
    /// Self-assessed confidence in `[0, 1]`.
    pub confidence: Dec,
    /// Known failure modes of the reasoning.
    #[serde(default)]
    pub failure_modes: Vec<String>,
    /// True when the output is opinion rather than fact.
    #[serde(default)]
    pub is_subjective: bool,
    /// Recommendation text, when the output makes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

// ============================================================================
// SECTION: Agent Output
// ============================================================================

/// Content of a debate agent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateContent {
    /// Narrative text.
    pub text: String,
    /// True when the content is subjective.
    #[serde(default)]
    pub is_subjective: bool,
}

/// One output produced by a debate agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Output identifier.
    pub output_id: String,
    /// Producing agent identifier.
    pub agent_id: String,
    /// Producing agent role.
    pub role: AgentRole,
    /// Output content.
    pub content: DebateContent,
    /// Required self-check record; `None` is rejected by the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muhasabah: Option<MuhasabahRecord>,
}
