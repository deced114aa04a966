// idis-core/src/runtime/mod.rs
// ============================================================================
// Module: IDIS Runtime Engines
// Description: Grading, calculation, extraction, debate, saga, orchestration.
// Purpose: Deterministic engines composing the diligence pipeline.
// Dependencies: crate::{core, interfaces, validators, audit}
// ============================================================================

//! ## Overview
//! The runtime engines are the single canonical execution paths for IDIS:
//! the Sanad grader, the Decimal-only calc engine, the extraction pipeline,
//! the debate loop with its Muḥāsabah gate, the dual-write saga, and the run
//! orchestrator. All are deterministic and fail closed; none reads wall-clock
//! time or randomness outside the injected seams.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod calc;
pub mod debate;
pub mod defects;
pub mod extraction;
pub mod grader;
pub mod orchestrator;
pub mod saga;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use calc::CalcEngine;
pub use calc::CalcEngineResult;
pub use calc::CalcError;
pub use calc::FormulaRegistry;
pub use calc::InputGradeInfo;
pub use debate::DebateAgent;
pub use debate::DebateError;
pub use debate::DebateOrchestrator;
pub use debate::DebateResult;
pub use debate::StopReason;
pub use defects::DefectLifecycle;
pub use defects::DefectLifecycleError;
pub use defects::enforce_fatal_invariant;
pub use extraction::ClaimExtractor;
pub use extraction::ExtractionPipeline;
pub use extraction::ExtractionStatus;
pub use extraction::ExtractionSummary;
pub use extraction::PatternClaimExtractor;
pub use grader::GraderInput;
pub use grader::SanadGradeResult;
pub use grader::grade_sanad;
pub use orchestrator::OrchestratorError;
pub use orchestrator::RunContext;
pub use orchestrator::RunOrchestrator;
pub use orchestrator::RunResult;
pub use orchestrator::StepError;
pub use orchestrator::StepOutcome;
pub use saga::InMemoryGraphStore;
pub use saga::ProjectionService;
pub use saga::ProjectionStatus;
pub use saga::SagaExecutor;
pub use saga::SagaStatus;
pub use store::InMemoryStore;
