// idis-core/tests/saga.rs
// ============================================================================
// Module: Dual-Write Saga Tests
// Description: Compensation ordering and projection status semantics.
// ============================================================================
//! ## Overview
//! Validates forward execution, reverse-order compensation, best-effort
//! compensation on failure, and the SKIPPED/FAILED/AUDIT_FAILURE projection
//! ladder.

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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use idis_core::audit::sink::InMemoryAuditSink;
use idis_core::core::identifiers::TenantId;
use idis_core::interfaces::GraphStore;
use idis_core::interfaces::NodeLabel;
use idis_core::runtime::saga::InMemoryGraphStore;
use idis_core::runtime::saga::ProjectionService;
use idis_core::runtime::saga::ProjectionStatus;
use idis_core::runtime::saga::SagaContext;
use idis_core::runtime::saga::SagaExecutor;
use idis_core::runtime::saga::SagaStatus;
use idis_core::runtime::saga::SagaStepError;
use idis_core::runtime::saga::SagaStepStatus;
use idis_core::tooling::FailingAuditSink;
use idis_core::tooling::FixedClock;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Shared call log for ordering assertions.
type CallLog = Arc<Mutex<Vec<String>>>;

/// Appends a label to the call log.
fn log_call(log: &CallLog, label: &str) {
    if let Ok(mut guard) = log.lock() {
        guard.push(label.to_string());
    }
}

/// Step that succeeds and records its forward/compensation calls.
fn recording_step(
    executor: SagaExecutor,
    name: &str,
    log: &CallLog,
) -> SagaExecutor {
    let forward_log = Arc::clone(log);
    let forward_name = name.to_string();
    let compensate_log = Arc::clone(log);
    let compensate_name = name.to_string();
    executor.add_step(
        name,
        Box::new(move |_ctx: &mut SagaContext| {
            log_call(&forward_log, &format!("{forward_name}:execute"));
            Ok(format!("{forward_name}-id"))
        }),
        Box::new(move |_ctx: &mut SagaContext, result: &str| {
            log_call(&compensate_log, &format!("{compensate_name}:compensate:{result}"));
            Ok(())
        }),
    )
}

/// Step whose forward action always fails.
fn failing_step(executor: SagaExecutor, name: &str) -> SagaExecutor {
    let message = format!("{name} backend down");
    executor.add_step(
        name,
        Box::new(move |_ctx: &mut SagaContext| Err(SagaStepError(message.clone()))),
        Box::new(|_ctx: &mut SagaContext, _result: &str| Ok(())),
    )
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Tests all steps completing yields COMPLETED with no compensation.
#[test]
fn test_saga_completes() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut executor = SagaExecutor::new("saga-1");
    executor = recording_step(executor, "postgres_claim_insert", &log);
    executor = recording_step(executor, "graph_claim_insert", &log);

    let result = executor.execute(SagaContext::new()).unwrap();
    assert_eq!(result.status, SagaStatus::Completed);
    assert!(result.is_success());
    let calls = log.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec!["postgres_claim_insert:execute", "graph_claim_insert:execute"]
    );
}

/// Tests the first failure compensates completed steps in reverse order.
#[test]
fn test_failure_compensates_in_reverse_order() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut executor = SagaExecutor::new("saga-2");
    executor = recording_step(executor, "step_a", &log);
    executor = recording_step(executor, "step_b", &log);
    executor = failing_step(executor, "step_c");

    let result = executor.execute(SagaContext::new()).unwrap();
    assert_eq!(result.status, SagaStatus::Compensated);
    let calls = log.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            "step_a:execute",
            "step_b:execute",
            "step_b:compensate:step_b-id",
            "step_a:compensate:step_a-id",
        ]
    );
}

/// Tests a compensation failure is recorded without halting the others.
#[test]
fn test_compensation_failure_is_best_effort() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut executor = SagaExecutor::new("saga-3");
    executor = recording_step(executor, "step_a", &log);

    // step_b compensation fails; step_a must still compensate.
    let forward_log = Arc::clone(&log);
    executor = executor.add_step(
        "step_b",
        Box::new(move |_ctx: &mut SagaContext| {
            log_call(&forward_log, "step_b:execute");
            Ok("step_b-id".to_string())
        }),
        Box::new(|_ctx: &mut SagaContext, _result: &str| {
            Err(SagaStepError("compensation rejected".to_string()))
        }),
    );
    executor = failing_step(executor, "step_c");

    let error = executor.execute(SagaContext::new()).unwrap_err();
    let result = error.result;
    assert_eq!(result.status, SagaStatus::CompensationFailed);

    let comp_statuses: Vec<(String, SagaStepStatus)> = result
        .step_results
        .iter()
        .filter(|step| step.step_name.ends_with("_compensation"))
        .map(|step| (step.step_name.clone(), step.status))
        .collect();
    assert_eq!(comp_statuses.len(), 2);
    assert_eq!(comp_statuses[0].1, SagaStepStatus::CompensationFailed);
    assert_eq!(comp_statuses[1].1, SagaStepStatus::Compensated);

    // step_a's compensation still ran despite step_b's failure.
    let calls = log.lock().unwrap().clone();
    assert!(calls.contains(&"step_a:compensate:step_a-id".to_string()));
}

// ============================================================================
// SECTION: Projection Service
// ============================================================================

/// Tenant under projection.
fn tenant() -> TenantId {
    TenantId::new("t-1")
}

/// Clock for projection audits.
fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at("2026-01-11T12:00:00Z").unwrap())
}

/// Tests an unconfigured graph projects as SKIPPED, not an error.
#[test]
fn test_projection_skipped_without_graph() {
    let audit = Arc::new(InMemoryAuditSink::new());
    let service = ProjectionService::new(None, audit.clone(), clock());
    let status =
        service.project_entity(&tenant(), NodeLabel::Claim, "claim", "c-1", &BTreeMap::new());
    assert_eq!(status, ProjectionStatus::Skipped);
    assert!(audit.events().is_empty());
}

/// Tests a successful projection writes the tenant-keyed node.
#[test]
fn test_projection_completed() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let service = ProjectionService::new(Some(graph.clone()), audit, clock());

    let status =
        service.project_entity(&tenant(), NodeLabel::Claim, "claim", "c-1", &BTreeMap::new());
    assert_eq!(status, ProjectionStatus::Completed);
    assert!(graph.has_node(&tenant(), "c-1").unwrap());
    // The write is keyed by tenant: another tenant sees nothing.
    assert!(!graph.has_node(&TenantId::new("t-other"), "c-1").unwrap());
}

/// Tests a projection failure records FAILED and a HIGH audit event.
#[test]
fn test_projection_failure_audited() {
    let graph = Arc::new(InMemoryGraphStore::new());
    graph.set_failing(true);
    let audit = Arc::new(InMemoryAuditSink::new());
    let service = ProjectionService::new(Some(graph), audit.clone(), clock());

    let status =
        service.project_entity(&tenant(), NodeLabel::Claim, "claim", "c-1", &BTreeMap::new());
    assert_eq!(status, ProjectionStatus::Failed);
    let events = audit.events_with_prefix("graph_projection.claim.failed");
    assert_eq!(events.len(), 1);
}

/// Tests projection failure plus audit failure surfaces AUDIT_FAILURE.
#[test]
fn test_projection_audit_failure_compound_state() {
    let graph = Arc::new(InMemoryGraphStore::new());
    graph.set_failing(true);
    let service = ProjectionService::new(Some(graph), Arc::new(FailingAuditSink::new()), clock());

    let status =
        service.project_entity(&tenant(), NodeLabel::Claim, "claim", "c-1", &BTreeMap::new());
    assert_eq!(status, ProjectionStatus::AuditFailure);
}
