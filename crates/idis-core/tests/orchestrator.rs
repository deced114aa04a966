// idis-core/tests/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator Tests
// Description: Step ledger, resume, partial, and fail-closed audit behavior.
// ============================================================================
//! ## Overview
//! Validates the canonical step sequences, error persistence, idempotent
//! resume, partial propagation, and the fatal audit-sink contract.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use idis_core::audit::sink::InMemoryAuditSink;
use idis_core::core::document::Document;
use idis_core::core::document::DocumentType;
use idis_core::core::document::Span;
use idis_core::core::document::SpanLocator;
use idis_core::core::document::SpanType;
use idis_core::core::hashing::hash_bytes;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::DocumentId;
use idis_core::core::identifiers::RunId;
use idis_core::core::identifiers::SpanId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::run::RunMode;
use idis_core::core::run::RunStatus;
use idis_core::core::run::StepName;
use idis_core::core::run::StepStatus;
use idis_core::core::time::Timestamp;
use idis_core::interfaces::RunStepRepository;
use idis_core::runtime::orchestrator::OrchestratorError;
use idis_core::runtime::orchestrator::RunContext;
use idis_core::runtime::orchestrator::RunOrchestrator;
use idis_core::runtime::orchestrator::StepError;
use idis_core::runtime::orchestrator::StepOutcome;
use idis_core::runtime::store::InMemoryStore;
use idis_core::tooling::FailingAuditSink;
use idis_core::tooling::FixedClock;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Tenant used across the suite.
fn tenant() -> TenantId {
    TenantId::new("11111111-1111-1111-1111-111111111111")
}

/// Minimal ingested document with one span.
fn documents() -> Vec<Document> {
    vec![Document {
        document_id: DocumentId::new("doc-001"),
        tenant_id: tenant(),
        doc_type: DocumentType::Pdf,
        document_name: "test.pdf".to_string(),
        version: 1,
        sha256: hash_bytes(b"test.pdf"),
        ingested_at: Timestamp::parse("2026-01-11T09:00:00Z").unwrap(),
        spans: vec![Span {
            span_id: SpanId::new("span-001"),
            document_id: DocumentId::new("doc-001"),
            span_type: SpanType::PageText,
            locator: SpanLocator::Pdf { page: 1, line: 1 },
            text_excerpt: "Revenue was $5M.".to_string(),
            content_sha256: hash_bytes(b"Revenue was $5M."),
        }],
        metric_values: std::collections::BTreeMap::new(),
    }]
}

/// Orchestrator over shared in-memory stores.
fn orchestrator(
    sink: Arc<dyn idis_core::interfaces::AuditSink>,
    store: &InMemoryStore,
) -> RunOrchestrator {
    RunOrchestrator::new(
        sink,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(FixedClock::at("2026-01-11T12:00:00Z").unwrap()),
    )
}

/// Deterministic stub step function returning a fixed summary.
fn stub(summary: serde_json::Value) -> idis_core::runtime::orchestrator::StepFn {
    Arc::new(move |_ctx, _outputs| Ok(StepOutcome::complete(summary.clone())))
}

/// Context with deterministic stub step functions for the given mode.
fn context(run_id: &RunId, mode: RunMode) -> RunContext {
    let mut ctx = RunContext::new(
        run_id.clone(),
        tenant(),
        DealId::new("d-1"),
        mode,
        documents(),
    );
    ctx = ctx.with_step(
        StepName::Extract,
        stub(json!({"created_claim_ids": ["claim-001", "claim-002"], "chunk_count": 1})),
    );
    ctx = ctx.with_step(StepName::Grade, stub(json!({"graded_count": 2, "failed_count": 0})));
    ctx = ctx.with_step(StepName::Calc, stub(json!({"calc_ids": ["calc-001"]})));
    if mode == RunMode::Full {
        ctx = ctx.with_step(StepName::Enrichment, stub(json!({"provider_count": 0})));
        ctx = ctx.with_step(
            StepName::Debate,
            stub(json!({"stop_reason": "MAX_ROUNDS", "round_number": 5})),
        );
        ctx = ctx.with_step(StepName::Analysis, stub(json!({"agent_count": 8})));
        ctx = ctx.with_step(
            StepName::Scoring,
            stub(json!({"composite_score": "72.5", "band": "MEDIUM"})),
        );
        ctx = ctx.with_step(StepName::Deliverables, stub(json!({"deliverable_count": 4})));
    }
    ctx
}

// ============================================================================
// SECTION: Step Sequences
// ============================================================================

/// Tests a SNAPSHOT run records four completed steps in canonical order.
#[test]
fn test_snapshot_records_four_steps_in_order() {
    let sink = InMemoryAuditSink::new();
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(sink.clone()), &store);
    let run_id = RunId::new("run-snapshot");

    let result = orchestrator.execute(&context(&run_id, RunMode::Snapshot)).unwrap();

    assert_eq!(result.status, RunStatus::Succeeded);
    assert_eq!(result.steps.len(), 4);
    let expected = [StepName::IngestCheck, StepName::Extract, StepName::Grade, StepName::Calc];
    for (index, step) in result.steps.iter().enumerate() {
        assert_eq!(step.step_name, expected[index]);
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.step_order, u32::try_from(index).unwrap());
        assert!(step.started_at.is_some());
        assert!(step.finished_at.is_some());
    }

    let started = sink.events_with_prefix("run.step.started");
    let completed = sink.events_with_prefix("run.step.completed");
    assert_eq!(started.len(), 4);
    assert_eq!(completed.len(), 4);
}

/// Tests a FULL run completes all nine steps in canonical order.
#[test]
fn test_full_completes_all_nine_steps() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(InMemoryAuditSink::new()), &store);
    let run_id = RunId::new("run-full");

    let result = orchestrator.execute(&context(&run_id, RunMode::Full)).unwrap();

    assert_eq!(result.status, RunStatus::Succeeded);
    let completed: Vec<StepName> = result
        .steps
        .iter()
        .filter(|step| step.status == StepStatus::Completed)
        .map(|step| step.step_name)
        .collect();
    assert_eq!(completed, StepName::full_sequence().to_vec());
}

// ============================================================================
// SECTION: Failure Handling
// ============================================================================

/// Tests step errors persist error_code and error_message on the ledger.
#[test]
fn test_step_errors_persisted_and_returned() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(InMemoryAuditSink::new()), &store);
    let run_id = RunId::new("run-failing");

    let mut ctx = context(&run_id, RunMode::Snapshot);
    ctx = ctx.with_step(
        StepName::Extract,
        Arc::new(|_, _| {
            Err(StepError::new("EXTRACTOR_UNAVAILABLE", "Extraction service unavailable"))
        }),
    );

    let result = orchestrator.execute(&ctx).unwrap();
    assert_eq!(result.status, RunStatus::Failed);

    let failed: Vec<_> =
        result.steps.iter().filter(|step| step.status == StepStatus::Failed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].step_name, StepName::Extract);
    assert_eq!(failed[0].error_code.as_deref(), Some("EXTRACTOR_UNAVAILABLE"));
    assert!(failed[0].error_message.as_deref().unwrap().contains("unavailable"));
    assert!(failed[0].finished_at.is_some());

    let completed: Vec<_> =
        result.steps.iter().filter(|step| step.status == StepStatus::Completed).collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].step_name, StepName::IngestCheck);
}

/// Tests a PARTIAL step result marks the run PARTIAL but continues.
#[test]
fn test_partial_step_marks_run_partial() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(InMemoryAuditSink::new()), &store);
    let run_id = RunId::new("run-partial");

    let mut ctx = context(&run_id, RunMode::Snapshot);
    ctx = ctx.with_step(
        StepName::Extract,
        Arc::new(|_, _| {
            Ok(StepOutcome::partial(json!({"status": "PARTIAL", "failed_span_count": 1})))
        }),
    );

    let result = orchestrator.execute(&ctx).unwrap();
    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.steps.len(), 4);
    assert!(result.steps.iter().all(|step| step.status == StepStatus::Completed));
}

/// Tests an audit sink error aborts the run and surfaces unmodified.
#[test]
fn test_audit_failure_aborts_run_fail_closed() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(FailingAuditSink::new()), &store);
    let run_id = RunId::new("run-audit-fail");

    let result = orchestrator.execute(&context(&run_id, RunMode::Snapshot));
    match result {
        Err(OrchestratorError::Audit(error)) => {
            assert!(error.to_string().contains("disk full"));
        }
        other => panic!("expected audit failure, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Resume
// ============================================================================

/// Tests re-invoking execute after success leaves the ledger unchanged.
#[test]
fn test_reexecution_is_idempotent() {
    let sink = InMemoryAuditSink::new();
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(sink.clone()), &store);
    let run_id = RunId::new("run-idempotent");
    let ctx = context(&run_id, RunMode::Snapshot);

    let first = orchestrator.execute(&ctx).unwrap();
    let events_after_first = sink.events().len();

    let second = orchestrator.execute(&ctx).unwrap();
    assert_eq!(second.status, RunStatus::Succeeded);
    assert_eq!(first.steps.len(), second.steps.len());
    // Completed steps are skipped: no duplicate audit on resume.
    assert_eq!(sink.events().len(), events_after_first);
}

/// Tests resume re-executes from the first non-completed step only.
#[test]
fn test_resume_from_failed_step() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(InMemoryAuditSink::new()), &store);
    let run_id = RunId::new("run-resume");
    let calls = Arc::new(AtomicU32::new(0));

    let mut failing_ctx = context(&run_id, RunMode::Snapshot);
    failing_ctx = failing_ctx.with_step(
        StepName::Extract,
        Arc::new(|_, _| Err(StepError::new("FLAKY", "first attempt fails"))),
    );
    let failed = orchestrator.execute(&failing_ctx).unwrap();
    assert_eq!(failed.status, RunStatus::Failed);

    let counting = Arc::clone(&calls);
    let mut retry_ctx = context(&run_id, RunMode::Snapshot);
    retry_ctx = retry_ctx.with_step(
        StepName::Extract,
        Arc::new(move |_, _| {
            counting.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::complete(json!({"created_claim_ids": ["claim-001"]})))
        }),
    );
    let resumed = orchestrator.execute(&retry_ctx).unwrap();

    assert_eq!(resumed.status, RunStatus::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let extract = resumed
        .steps
        .iter()
        .find(|step| step.step_name == StepName::Extract)
        .unwrap();
    assert_eq!(extract.status, StepStatus::Completed);
    assert_eq!(extract.retry_count, 1);

    // Ledger orders stay contiguous with no duplicates after resume.
    let ledger = store.steps_for_run(&tenant(), &run_id).unwrap();
    let orders: Vec<u32> = ledger.iter().map(|step| step.step_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

// ============================================================================
// SECTION: Tenant Isolation
// ============================================================================

/// Tests cross-tenant ledger reads return nothing.
#[test]
fn test_cross_tenant_ledger_read_is_empty() {
    let store = InMemoryStore::new();
    let orchestrator = orchestrator(Arc::new(InMemoryAuditSink::new()), &store);
    let run_id = RunId::new("run-isolated");
    orchestrator.execute(&context(&run_id, RunMode::Snapshot)).unwrap();

    let other_tenant = TenantId::new("22222222-2222-2222-2222-222222222222");
    let foreign = store.steps_for_run(&other_tenant, &run_id).unwrap();
    assert!(foreign.is_empty());
}
