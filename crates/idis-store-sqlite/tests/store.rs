// idis-store-sqlite/tests/store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Tenant-scoped persistence and transactional audit coupling.
// ============================================================================
//! ## Overview
//! Validates repository round trips, cross-tenant not-found behavior, step
//! ledger ordering, claim-to-deal resolution, and the mutation-atomic audit
//! transaction.

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

use std::collections::BTreeSet;

use idis_core::core::audit::ActorType;
use idis_core::core::audit::AuditActor;
use idis_core::core::audit::AuditEvent;
use idis_core::core::audit::AuditPayload;
use idis_core::core::audit::AuditRequest;
use idis_core::core::audit::AuditResource;
use idis_core::core::audit::AuditSeverity;
use idis_core::core::audit::HttpMethod;
use idis_core::core::audit::ResourceType;
use idis_core::core::claim::Claim;
use idis_core::core::claim::ClaimAction;
use idis_core::core::claim::ClaimClass;
use idis_core::core::claim::ClaimVerdict;
use idis_core::core::claim::Grade;
use idis_core::core::claim::Materiality;
use idis_core::core::deal::Deal;
use idis_core::core::deal::DealStage;
use idis_core::core::deal::DealStatus;
use idis_core::core::identifiers::ActorId;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::EventId;
use idis_core::core::identifiers::EvidenceId;
use idis_core::core::identifiers::RequestId;
use idis_core::core::identifiers::RunId;
use idis_core::core::identifiers::SpanId;
use idis_core::core::identifiers::StepId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::run::RunStep;
use idis_core::core::run::StepName;
use idis_core::core::run::StepStatus;
use idis_core::core::time::Timestamp;
use idis_core::interfaces::AuditSink;
use idis_core::interfaces::ClaimDealResolver;
use idis_core::interfaces::ClaimRepository;
use idis_core::interfaces::DealAssignmentStore;
use idis_core::interfaces::DealRepository;
use idis_core::interfaces::RunStepRepository;
use idis_store_sqlite::SqliteStore;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Pinned timestamp.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// Deal under tenant A.
fn deal(tenant: &TenantId, id: &str) -> Deal {
    Deal {
        deal_id: DealId::new(id),
        tenant_id: tenant.clone(),
        company_name: "Acme Corp".to_string(),
        stage: DealStage::SeriesA,
        status: DealStatus::Screening,
        created_at: now(),
        updated_at: now(),
        tags: BTreeSet::new(),
    }
}

/// Claim under the given deal.
fn claim(tenant: &TenantId, deal_id: &DealId, id: &str) -> Claim {
    Claim {
        claim_id: ClaimId::new(id),
        tenant_id: tenant.clone(),
        deal_id: deal_id.clone(),
        claim_class: ClaimClass::Financial,
        text: "Revenue was $5M.".to_string(),
        value: None,
        claim_grade: Grade::D,
        claim_verdict: ClaimVerdict::Unverified,
        claim_action: ClaimAction::Verify,
        materiality: Materiality::Medium,
        primary_span_id: SpanId::new("span-1"),
        cited_document: None,
        extraction_confidence: None,
        dhabt_score: None,
        is_factual: true,
        is_subjective: false,
        evidence_ids: vec![EvidenceId::new("e-1")],
        calc_ids: Vec::new(),
        created_at: now(),
        updated_at: now(),
    }
}

/// A valid deal.created audit event.
fn audit_event(tenant: &TenantId, resource_id: &str) -> AuditEvent {
    AuditEvent {
        event_id: EventId::mint(),
        occurred_at: now(),
        tenant_id: tenant.clone(),
        actor: AuditActor {
            actor_type: ActorType::Service,
            actor_id: ActorId::new("svc-1"),
            roles: vec!["INTEGRATION_SERVICE".to_string()],
            ip: "127.0.0.1".to_string(),
            user_agent: "tests".to_string(),
        },
        request: AuditRequest {
            request_id: RequestId::new("req-1"),
            method: HttpMethod::Post,
            path: "/v1/deals".to_string(),
            status_code: 201,
            idempotency_key: None,
        },
        resource: AuditResource {
            resource_type: ResourceType::Deal,
            resource_id: resource_id.to_string(),
        },
        event_type: "deal.created".to_string(),
        severity: AuditSeverity::Medium,
        summary: "deal.created via POST /v1/deals".to_string(),
        payload: AuditPayload::default(),
    }
}

// ============================================================================
// SECTION: Repository Round Trips
// ============================================================================

/// Tests deal create/get/update under tenant scope.
#[test]
fn test_deal_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let mut record = deal(&tenant, "d-1");
    DealRepository::create(&store, &record).unwrap();

    let loaded = DealRepository::get(&store, &tenant, &record.deal_id).unwrap().unwrap();
    assert_eq!(loaded, record);

    record.status = DealStatus::Diligence;
    DealRepository::update(&store, &record).unwrap();
    let reloaded = DealRepository::get(&store, &tenant, &record.deal_id).unwrap().unwrap();
    assert_eq!(reloaded.status, DealStatus::Diligence);
}

/// Tests cross-tenant reads return not-found, never a permission error.
#[test]
fn test_cross_tenant_reads_are_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant_a = TenantId::new("t-a");
    let tenant_b = TenantId::new("t-b");
    let record = deal(&tenant_a, "d-1");
    DealRepository::create(&store, &record).unwrap();

    let foreign = DealRepository::get(&store, &tenant_b, &record.deal_id).unwrap();
    assert!(foreign.is_none());

    let listing = DealRepository::list(&store, &tenant_b).unwrap();
    assert!(listing.is_empty());
}

/// Tests claim persistence and claim-to-deal resolution under tenant scope.
#[test]
fn test_claim_round_trip_and_resolution() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let parent = DealId::new("d-1");
    let record = claim(&tenant, &parent, "c-1");
    ClaimRepository::create(&store, &record).unwrap();

    let resolved = store.resolve_deal_id_for_claim(&tenant, &record.claim_id).unwrap();
    assert_eq!(resolved, Some(parent.clone()));

    // Cross-tenant resolution yields nothing (no existence leak).
    let foreign = store
        .resolve_deal_id_for_claim(&TenantId::new("t-b"), &record.claim_id)
        .unwrap();
    assert!(foreign.is_none());

    let listed = ClaimRepository::list_for_deal(&store, &tenant, &parent).unwrap();
    assert_eq!(listed.len(), 1);
}

/// Tests the step ledger sorts by step order and stays tenant-scoped.
#[test]
fn test_step_ledger_ordering() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let run_id = RunId::new("run-1");
    let names = [StepName::Calc, StepName::IngestCheck, StepName::Extract, StepName::Grade];
    let orders = [3_u32, 0, 1, 2];
    for (name, order) in names.iter().zip(orders) {
        let step = RunStep {
            step_id: StepId::mint(),
            tenant_id: tenant.clone(),
            run_id: run_id.clone(),
            step_name: *name,
            step_order: order,
            status: StepStatus::Completed,
            started_at: Some(now()),
            finished_at: Some(now()),
            retry_count: 0,
            result_summary: serde_json::json!({}),
            error_code: None,
            error_message: None,
        };
        RunStepRepository::create(&store, &step).unwrap();
    }

    let ledger = store.steps_for_run(&tenant, &run_id).unwrap();
    let observed: Vec<u32> = ledger.iter().map(|step| step.step_order).collect();
    assert_eq!(observed, vec![0, 1, 2, 3]);
    assert_eq!(ledger[0].step_name, StepName::IngestCheck);

    let foreign = store.steps_for_run(&TenantId::new("t-b"), &run_id).unwrap();
    assert!(foreign.is_empty());
}

// ============================================================================
// SECTION: Assignments
// ============================================================================

/// Tests direct assignments are tenant-scoped and deny by default.
#[test]
fn test_assignments_tenant_scoped() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let deal_id = DealId::new("d-1");
    let actor = ActorId::new("actor-1");

    assert!(!store.is_actor_assigned(&tenant, &deal_id, &actor));
    store.add_assignment(&tenant, &deal_id, &actor).unwrap();
    assert!(store.is_actor_assigned(&tenant, &deal_id, &actor));
    assert!(!store.is_actor_assigned(&TenantId::new("t-b"), &deal_id, &actor));
}

// ============================================================================
// SECTION: Transactional Audit
// ============================================================================

/// Tests the deal insert and audit insert commit together.
#[test]
fn test_create_with_audit_commits_both() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let record = deal(&tenant, "d-1");
    let event = audit_event(&tenant, "d-1");

    store.create_deal_with_audit(&record, &event).unwrap();

    assert!(DealRepository::get(&store, &tenant, &record.deal_id).unwrap().is_some());
    let events = store.list_audit_events(&tenant).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "deal.created");
}

/// Tests an invalid audit event rolls back the mutation entirely.
#[test]
fn test_invalid_audit_rolls_back_mutation() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let record = deal(&tenant, "d-1");
    let mut event = audit_event(&tenant, "d-1");
    event.event_type = "mystery.created".to_string();

    let result = store.create_deal_with_audit(&record, &event);
    assert!(result.is_err());

    // The mutation never became visible.
    assert!(DealRepository::get(&store, &tenant, &record.deal_id).unwrap().is_none());
    assert!(store.list_audit_events(&tenant).unwrap().is_empty());
}

/// Tests duplicate event ids abort the transaction and the mutation.
#[test]
fn test_duplicate_event_id_rolls_back_mutation() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    let first = deal(&tenant, "d-1");
    let event = audit_event(&tenant, "d-1");
    store.create_deal_with_audit(&first, &event).unwrap();

    // Reusing the same event id must fail and leave the second deal unwritten.
    let second = deal(&tenant, "d-2");
    let mut duplicate = audit_event(&tenant, "d-2");
    duplicate.event_id = event.event_id.clone();
    let result = store.create_deal_with_audit(&second, &duplicate);
    assert!(result.is_err());
    assert!(DealRepository::get(&store, &tenant, &second.deal_id).unwrap().is_none());
}

/// Tests standalone sink emission preserves order per tenant.
#[test]
fn test_sink_emission_order() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tenant = TenantId::new("t-a");
    for index in 0..3 {
        let mut event = audit_event(&tenant, &format!("d-{index}"));
        event.summary = format!("event {index}");
        store.emit(&event).unwrap();
    }
    let events = store.list_audit_events(&tenant).unwrap();
    let summaries: Vec<String> = events.iter().map(|event| event.summary.clone()).collect();
    assert_eq!(summaries, vec!["event 0", "event 1", "event 2"]);
}

/// Tests durable persistence across a reopen.
#[test]
fn test_reopen_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idis.db");
    let tenant = TenantId::new("t-a");
    {
        let store =
            SqliteStore::open(&idis_store_sqlite::SqliteStoreConfig::at(&path)).unwrap();
        DealRepository::create(&store, &deal(&tenant, "d-1")).unwrap();
    }
    let reopened = SqliteStore::open(&idis_store_sqlite::SqliteStoreConfig::at(&path)).unwrap();
    assert!(DealRepository::get(&reopened, &tenant, &DealId::new("d-1")).unwrap().is_some());
}
