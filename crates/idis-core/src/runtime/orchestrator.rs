// idis-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: IDIS Run Orchestrator
// Description: Resumable, idempotent 4/9-step pipeline with a step ledger.
// Purpose: Execute diligence runs with fail-closed audit at every transition.
// Dependencies: crate::{core, interfaces, audit}
// ============================================================================

//! ## Overview
//! The orchestrator composes SNAPSHOT (4 steps) or FULL (9 steps) pipelines
//! over injected step functions. The ledger is the resume protocol: a step
//! already COMPLETED is skipped without duplicate audit, a RUNNING or FAILED
//! step re-executes, and re-invoking `execute` after success leaves the
//! ledger unchanged. Every transition emits an audit event; a sink rejection
//! at any step aborts the run and surfaces the audit error unmodified. Step
//! failures persist an error category and message, never a backtrace, and
//! stop the pipeline. A step reporting partial success marks the run PARTIAL
//! but continues. Concurrent execution of one run id must be prevented by
//! the caller (an advisory lock keyed by `run_id` is recommended); the
//! ledger makes repeated invocations safe, not simultaneous ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::audit::ActorType;
use crate::core::audit::AuditActor;
use crate::core::audit::AuditEvent;
use crate::core::audit::AuditPayload;
use crate::core::audit::AuditRequest;
use crate::core::audit::AuditResource;
use crate::core::audit::AuditSeverity;
use crate::core::audit::HttpMethod;
use crate::core::audit::ResourceType;
use crate::core::document::Document;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::StepId;
use crate::core::identifiers::TenantId;
use crate::core::run::Run;
use crate::core::run::RunMode;
use crate::core::run::RunStatus;
use crate::core::run::RunStep;
use crate::core::run::StepName;
use crate::core::run::StepStatus;
use crate::interfaces::AuditSink;
use crate::interfaces::AuditSinkError;
use crate::interfaces::Clock;
use crate::interfaces::RepoError;
use crate::interfaces::RunRepository;
use crate::interfaces::RunStepRepository;

// ============================================================================
// SECTION: Step Functions
// ============================================================================

/// Failure reported by a step function.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct StepError {
    /// Stable error category, persisted as `error_code`.
    pub code: String,
    /// Short message, persisted as `error_message`.
    pub message: String,
}

impl StepError {
    /// Builds a step error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Successful step outcome.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Canonical JSON summary persisted to the ledger.
    pub summary: serde_json::Value,
    /// True when the step succeeded only partially.
    pub partial: bool,
}

impl StepOutcome {
    /// Builds a complete outcome.
    #[must_use]
    pub const fn complete(summary: serde_json::Value) -> Self {
        Self {
            summary,
            partial: false,
        }
    }

    /// Builds a partial outcome.
    #[must_use]
    pub const fn partial(summary: serde_json::Value) -> Self {
        Self {
            summary,
            partial: true,
        }
    }
}

/// Accumulated summaries of completed steps, keyed by step name.
pub type StepOutputs = BTreeMap<StepName, serde_json::Value>;

/// Injected step function.
pub type StepFn =
    Arc<dyn Fn(&RunContext, &StepOutputs) -> Result<StepOutcome, StepError> + Send + Sync>;

// ============================================================================
// SECTION: Run Context
// ============================================================================

/// Everything one run execution needs.
#[derive(Clone)]
pub struct RunContext {
    /// Run identifier.
    pub run_id: RunId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent deal.
    pub deal_id: DealId,
    /// Pipeline mode.
    pub mode: RunMode,
    /// Ingested documents for the run.
    pub documents: Vec<Document>,
    /// Step functions keyed by step name; `INGEST_CHECK` has a built-in.
    pub step_fns: BTreeMap<StepName, StepFn>,
}

impl RunContext {
    /// Creates a context with no step functions registered.
    #[must_use]
    pub fn new(
        run_id: RunId,
        tenant_id: TenantId,
        deal_id: DealId,
        mode: RunMode,
        documents: Vec<Document>,
    ) -> Self {
        Self {
            run_id,
            tenant_id,
            deal_id,
            mode,
            documents,
            step_fns: BTreeMap::new(),
        }
    }

    /// Registers a step function.
    #[must_use]
    pub fn with_step(mut self, name: StepName, step_fn: StepFn) -> Self {
        self.step_fns.insert(name, step_fn);
        self
    }

    /// Returns the canonical step sequence for the mode.
    #[must_use]
    pub fn sequence(&self) -> Vec<StepName> {
        match self.mode {
            RunMode::Snapshot => StepName::snapshot_sequence().to_vec(),
            RunMode::Full => StepName::full_sequence().to_vec(),
        }
    }
}

// ============================================================================
// SECTION: Result and Errors
// ============================================================================

/// Result of one orchestrator execution.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Run identifier.
    pub run_id: RunId,
    /// Terminal run status.
    pub status: RunStatus,
    /// Ledger after execution, ordered by step order.
    pub steps: Vec<RunStep>,
}

/// Orchestrator failures.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The audit sink rejected an event; the run halted (fail-closed).
    #[error(transparent)]
    Audit(#[from] AuditSinkError),
    /// Ledger or run persistence failed.
    #[error(transparent)]
    Store(#[from] RepoError),
    /// A step named in the sequence has no registered function.
    #[error("no step function registered for {0}")]
    MissingStepFn(String),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Resumable run orchestrator with a persisted step ledger.
pub struct RunOrchestrator {
    /// Audit sink; every transition emits here.
    audit: Arc<dyn AuditSink>,
    /// Run persistence.
    runs: Arc<dyn RunRepository>,
    /// Step-ledger persistence.
    steps: Arc<dyn RunStepRepository>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl RunOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        audit: Arc<dyn AuditSink>,
        runs: Arc<dyn RunRepository>,
        steps: Arc<dyn RunStepRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            audit,
            runs,
            steps,
            clock,
        }
    }

    /// Executes (or resumes) a run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Audit`] unmodified when the sink rejects
    /// any event, and [`OrchestratorError::Store`] on ledger persistence
    /// failure. Step-function failures are persisted to the ledger and
    /// reported through the returned [`RunResult`], not as errors.
    #[allow(
        clippy::too_many_lines,
        reason = "Maintain a single linear flow for ordered ledger updates and auditability."
    )]
    pub fn execute(&self, ctx: &RunContext) -> Result<RunResult, OrchestratorError> {
        let sequence = ctx.sequence();
        let mut run = self.load_or_create_run(ctx)?;
        run.status = RunStatus::Running;
        run.updated_at = self.clock.now();
        self.runs.update(&run)?;

        let existing = self.steps.steps_for_run(&ctx.tenant_id, &ctx.run_id)?;
        let by_name: BTreeMap<StepName, RunStep> =
            existing.into_iter().map(|step| (step.step_name, step)).collect();

        let mut outputs: StepOutputs = BTreeMap::new();
        let mut saw_partial = false;
        let mut failed = false;

        for (order, name) in sequence.iter().enumerate() {
            let order = u32::try_from(order).unwrap_or(u32::MAX);

            // Resume: completed steps are skipped with no duplicate audit.
            if let Some(step) = by_name.get(name)
                && step.status == StepStatus::Completed
            {
                outputs.insert(*name, step.result_summary.clone());
                continue;
            }

            let started_at = self.clock.now();
            let mut step = by_name.get(name).cloned().map_or_else(
                || RunStep {
                    step_id: StepId::mint(),
                    tenant_id: ctx.tenant_id.clone(),
                    run_id: ctx.run_id.clone(),
                    step_name: *name,
                    step_order: order,
                    status: StepStatus::Running,
                    started_at: Some(started_at),
                    finished_at: None,
                    retry_count: 0,
                    result_summary: serde_json::Value::Null,
                    error_code: None,
                    error_message: None,
                },
                |mut prior| {
                    prior.status = StepStatus::Running;
                    prior.started_at = Some(started_at);
                    prior.finished_at = None;
                    prior.retry_count += 1;
                    prior
                },
            );
            if by_name.contains_key(name) {
                self.steps.update(&step)?;
            } else {
                self.steps.create(&step)?;
            }

            self.emit_step_event(ctx, *name, "run.step.started", None)?;

            match self.run_step(ctx, *name, &outputs) {
                Ok(outcome) => {
                    step.status = StepStatus::Completed;
                    step.finished_at = Some(self.clock.now());
                    step.result_summary = outcome.summary.clone();
                    self.steps.update(&step)?;
                    self.emit_step_event(ctx, *name, "run.step.completed", None)?;
                    outputs.insert(*name, outcome.summary);
                    if outcome.partial {
                        saw_partial = true;
                    }
                }
                Err(error) => {
                    step.status = StepStatus::Failed;
                    step.finished_at = Some(self.clock.now());
                    step.error_code = Some(error.code.clone());
                    step.error_message = Some(error.message.clone());
                    self.steps.update(&step)?;
                    self.emit_step_event(ctx, *name, "run.step.failed", Some(&error.code))?;
                    failed = true;
                    break;
                }
            }
        }

        let status = if failed {
            RunStatus::Failed
        } else if saw_partial {
            RunStatus::Partial
        } else {
            RunStatus::Succeeded
        };
        run.status = status;
        run.updated_at = self.clock.now();
        self.runs.update(&run)?;

        let steps = self.steps.steps_for_run(&ctx.tenant_id, &ctx.run_id)?;
        Ok(RunResult {
            run_id: ctx.run_id.clone(),
            status,
            steps,
        })
    }

    /// Loads the run record or creates it queued.
    fn load_or_create_run(&self, ctx: &RunContext) -> Result<Run, OrchestratorError> {
        if let Some(run) = self.runs.get(&ctx.tenant_id, &ctx.run_id)? {
            return Ok(run);
        }
        let now = self.clock.now();
        let run = Run {
            run_id: ctx.run_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            deal_id: ctx.deal_id.clone(),
            mode: ctx.mode,
            status: RunStatus::Queued,
            created_at: now,
            updated_at: now,
        };
        self.runs.create(&run)?;
        Ok(run)
    }

    /// Runs one step: the built-in ingest check or an injected function.
    fn run_step(
        &self,
        ctx: &RunContext,
        name: StepName,
        outputs: &StepOutputs,
    ) -> Result<StepOutcome, StepError> {
        if name == StepName::IngestCheck {
            return ingest_check(ctx);
        }
        let Some(step_fn) = ctx.step_fns.get(&name) else {
            return Err(StepError::new(
                "STEP_NOT_CONFIGURED",
                format!("no step function registered for {}", step_label(name)),
            ));
        };
        step_fn(ctx, outputs)
    }

    /// Emits one step-transition audit event; sink errors are fatal.
    fn emit_step_event(
        &self,
        ctx: &RunContext,
        name: StepName,
        event_type: &str,
        error_code: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        let mut safe = BTreeMap::new();
        safe.insert(
            "step_name".to_string(),
            serde_json::Value::String(step_label(name).to_string()),
        );
        if let Some(code) = error_code {
            safe.insert("error_code".to_string(), serde_json::Value::String(code.to_string()));
        }

        let event = AuditEvent {
            event_id: EventId::mint(),
            occurred_at: self.clock.now(),
            tenant_id: ctx.tenant_id.clone(),
            actor: AuditActor {
                actor_type: ActorType::Service,
                actor_id: ActorId::new("run-orchestrator"),
                roles: vec!["INTEGRATION_SERVICE".to_string()],
                ip: "internal".to_string(),
                user_agent: "idis-orchestrator".to_string(),
            },
            request: AuditRequest {
                request_id: RequestId::mint(),
                method: HttpMethod::Post,
                path: format!("/v1/deals/{}/runs", ctx.deal_id),
                status_code: 202,
                idempotency_key: None,
            },
            resource: AuditResource {
                resource_type: ResourceType::Run,
                resource_id: ctx.run_id.to_string(),
            },
            event_type: event_type.to_string(),
            severity: AuditSeverity::Low,
            summary: format!("{event_type} {}", step_label(name)),
            payload: AuditPayload {
                hashes: Vec::new(),
                refs: vec![format!("deal:{}", ctx.deal_id)],
                safe,
            },
        };
        self.audit.emit(&event)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Built-In Steps
// ============================================================================

/// Verifies the run has ingested documents with spans.
fn ingest_check(ctx: &RunContext) -> Result<StepOutcome, StepError> {
    if ctx.documents.is_empty() {
        return Err(StepError::new("NO_DOCUMENTS", "run has no ingested documents"));
    }
    let span_count: usize = ctx.documents.iter().map(|document| document.spans.len()).sum();
    if span_count == 0 {
        return Err(StepError::new("NO_SPANS", "ingested documents contain no spans"));
    }
    Ok(StepOutcome::complete(serde_json::json!({
        "document_count": ctx.documents.len(),
        "span_count": span_count,
    })))
}

/// Returns the canonical wire label of a step.
const fn step_label(name: StepName) -> &'static str {
    match name {
        StepName::IngestCheck => "INGEST_CHECK",
        StepName::Extract => "EXTRACT",
        StepName::Grade => "GRADE",
        StepName::Calc => "CALC",
        StepName::Enrichment => "ENRICHMENT",
        StepName::Debate => "DEBATE",
        StepName::Analysis => "ANALYSIS",
        StepName::Scoring => "SCORING",
        StepName::Deliverables => "DELIVERABLES",
    }
}
