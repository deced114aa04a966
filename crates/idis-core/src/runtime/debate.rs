// idis-core/src/runtime/debate.rs
// ============================================================================
// Module: IDIS Debate Orchestrator
// Description: Adversarial advocate/adversary/arbiter loop with a hard gate.
// Purpose: Run bounded debate rounds where every output passes Muḥāsabah.
// Dependencies: crate::{core, validators}
// ============================================================================

//! ## Overview
//! The debate runs up to a bounded number of rounds; each round asks the
//! advocate, the adversary, and finally the arbiter for an output. Every
//! output passes the Muḥāsabah gate before it enters the transcript; a gate
//! rejection halts the debate deterministically with a typed error carrying
//! the exact reason code. An arbiter recommendation ends the debate early.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::debate::AgentOutput;
use crate::core::debate::AgentRole;
use crate::validators::ValidationIssue;
use crate::validators::muhasabah::GateRejectionReason;
use crate::validators::muhasabah::validate_muhasabah;

// ============================================================================
// SECTION: Agent Seam
// ============================================================================

/// Agent backend failures.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent backend failed or timed out.
    #[error("agent error: {0}")]
    Backend(String),
}

/// A debate participant.
pub trait DebateAgent: Send + Sync {
    /// The role this agent plays.
    fn role(&self) -> AgentRole;

    /// Produces the agent's output for a round given the transcript so far.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the backend fails; the debate halts.
    fn next_output(
        &self,
        round: u32,
        transcript: &[AgentOutput],
    ) -> Result<AgentOutput, AgentError>;
}

// ============================================================================
// SECTION: Result Model
// ============================================================================

/// Why the debate stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    /// The round limit was reached.
    MaxRounds,
    /// The arbiter issued a recommendation.
    ArbiterRecommendation,
}

/// Completed debate transcript and outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateResult {
    /// Accepted outputs in production order.
    pub outputs: Vec<AgentOutput>,
    /// Rounds fully completed.
    pub rounds_completed: u32,
    /// Why the debate stopped.
    pub stop_reason: StopReason,
}

/// Debate failures.
#[derive(Debug, Error)]
pub enum DebateError {
    /// The gate rejected an output; the debate halted.
    #[error("muhasabah gate rejected output from {agent_id} in round {round}: {reason}")]
    GateRejected {
        /// Rejection reason code.
        reason: GateRejectionReason,
        /// Producing agent.
        agent_id: String,
        /// Round of the rejection.
        round: u32,
        /// Validator findings behind the rejection.
        errors: Vec<ValidationIssue>,
    },
    /// An agent backend failed.
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// The debate was configured without the three required roles.
    #[error("debate requires advocate, adversary, and arbiter agents")]
    MissingRoles,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Bounded adversarial debate orchestrator.
pub struct DebateOrchestrator {
    /// Participants; must cover advocate, adversary, and arbiter.
    agents: Vec<Box<dyn DebateAgent>>,
    /// Round bound.
    max_rounds: u32,
}

impl DebateOrchestrator {
    /// Creates an orchestrator over agents and a round bound.
    #[must_use]
    pub fn new(agents: Vec<Box<dyn DebateAgent>>, max_rounds: u32) -> Self {
        Self { agents, max_rounds }
    }

    /// Runs the debate to completion or first gate rejection.
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::GateRejected`] on the first gated output,
    /// [`DebateError::MissingRoles`] when the agent set is incomplete, and
    /// agent backend failures otherwise.
    pub fn run(&self) -> Result<DebateResult, DebateError> {
        for required in [AgentRole::Advocate, AgentRole::Adversary, AgentRole::Arbiter] {
            if !self.agents.iter().any(|agent| agent.role() == required) {
                return Err(DebateError::MissingRoles);
            }
        }

        let mut transcript: Vec<AgentOutput> = Vec::new();
        let mut rounds_completed = 0_u32;

        for round in 0..self.max_rounds {
            for role in [AgentRole::Advocate, AgentRole::Adversary, AgentRole::Arbiter] {
                let agent = self
                    .agents
                    .iter()
                    .find(|agent| agent.role() == role)
                    .ok_or(DebateError::MissingRoles)?;
                let output = agent.next_output(round, &transcript)?;
                gate_output(&output, round)?;

                let is_arbiter_recommendation = role == AgentRole::Arbiter
                    && output
                        .muhasabah
                        .as_ref()
                        .is_some_and(|record| record.recommendation.is_some());
                transcript.push(output);

                if is_arbiter_recommendation {
                    return Ok(DebateResult {
                        outputs: transcript,
                        rounds_completed: round + 1,
                        stop_reason: StopReason::ArbiterRecommendation,
                    });
                }
            }
            rounds_completed = round + 1;
        }

        Ok(DebateResult {
            outputs: transcript,
            rounds_completed,
            stop_reason: StopReason::MaxRounds,
        })
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Applies the Muḥāsabah gate to one output.
fn gate_output(output: &AgentOutput, round: u32) -> Result<(), DebateError> {
    let result = validate_muhasabah(output);
    if result.passed {
        return Ok(());
    }
    let reason = result
        .errors
        .first()
        .map_or(GateRejectionReason::InvalidMuhasabah, |issue| match issue.code.as_str() {
            "MISSING_MUHASABAH" => GateRejectionReason::MissingMuhasabah,
            "NO_FREE_FACTS_VIOLATION" => GateRejectionReason::NoFreeFactsViolation,
            _ => GateRejectionReason::InvalidMuhasabah,
        });
    Err(DebateError::GateRejected {
        reason,
        agent_id: output.agent_id.clone(),
        round,
        errors: result.errors,
    })
}
