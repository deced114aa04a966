// idis-core/src/core/run.rs
// ============================================================================
// Module: IDIS Run Model
// Description: Pipeline runs and their append-only step ledger.
// Purpose: Provide the resumable, idempotent run ledger structures.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A run is one orchestrated pipeline execution over a deal: SNAPSHOT runs
//! execute four steps, FULL runs nine. The step ledger is the source of truth
//! for resume: step orders are contiguous from zero, statuses transition
//! PENDING → RUNNING → COMPLETED/FAILED/SKIPPED, and result summaries are
//! canonical JSON so replays compare byte-for-byte.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DealId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::StepId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Run Enums
// ============================================================================

/// Pipeline composition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    /// Four-step screening pipeline.
    Snapshot,
    /// Nine-step full-diligence pipeline.
    Full,
}

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Accepted, not yet started.
    Queued,
    /// Executing.
    Running,
    /// All steps completed.
    Succeeded,
    /// A step failed and the pipeline stopped.
    Failed,
    /// Completed with at least one partial step result.
    Partial,
}

/// Canonical pipeline step names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepName {
    /// Verify ingested documents and spans are present.
    IngestCheck,
    /// Extract claims from document spans.
    Extract,
    /// Grade claims through the Sanad grader.
    Grade,
    /// Run deterministic calculations.
    Calc,
    /// Pull external enrichment data.
    Enrichment,
    /// Run the adversarial debate.
    Debate,
    /// Run analysis agents.
    Analysis,
    /// Compute the composite score.
    Scoring,
    /// Build and export deliverables.
    Deliverables,
}

impl StepName {
    /// Returns the canonical SNAPSHOT step sequence.
    #[must_use]
    pub const fn snapshot_sequence() -> [Self; 4] {
        [Self::IngestCheck, Self::Extract, Self::Grade, Self::Calc]
    }

    /// Returns the canonical FULL step sequence.
    #[must_use]
    pub const fn full_sequence() -> [Self; 9] {
        [
            Self::IngestCheck,
            Self::Extract,
            Self::Grade,
            Self::Calc,
            Self::Enrichment,
            Self::Debate,
            Self::Analysis,
            Self::Scoring,
            Self::Deliverables,
        ]
    }
}

/// Step lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Created but not started.
    Pending,
    /// Executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Failed; pipeline stopped here.
    Failed,
    /// Skipped on resume (already completed).
    Skipped,
}

// ============================================================================
// SECTION: Run Records
// ============================================================================

/// An orchestrated pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier.
    pub run_id: RunId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent deal.
    pub deal_id: DealId,
    /// Pipeline mode.
    pub mode: RunMode,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

/// One entry of the run step ledger.
///
/// # Invariants
/// - `step_order` values for a run form `0..N` with no gaps or duplicates.
/// - `result_summary` is canonical JSON.
/// - `error_message` never contains a stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStep {
    /// Step identifier.
    pub step_id: StepId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent run.
    pub run_id: RunId,
    /// Canonical step name.
    pub step_name: StepName,
    /// Position in the pipeline, starting at zero.
    pub step_order: u32,
    /// Lifecycle status.
    pub status: StepStatus,
    /// Start timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// Finish timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Number of retries so far.
    pub retry_count: u32,
    /// Canonical JSON summary of the step result.
    pub result_summary: serde_json::Value,
    /// Stable error category, when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Short error message, when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
