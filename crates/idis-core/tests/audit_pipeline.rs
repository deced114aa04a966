// idis-core/tests/audit_pipeline.rs
// ============================================================================
// Module: Audit Pipeline Tests
// Description: Validator, sinks, fail-closed guard, and idempotency replay.
// ============================================================================
//! ## Overview
//! Validates the closed event schema and redaction blocklist, the JSONL sink
//! line format, the fail-closed mutation guard, and idempotency-key replay.

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

use idis_core::audit::builder::AuditEventBuilder;
use idis_core::audit::pipeline::AuditPipeline;
use idis_core::audit::pipeline::MutationOutcome;
use idis_core::audit::pipeline::MutationRequest;
use idis_core::audit::pipeline::PipelineError;
use idis_core::audit::pipeline::body_hash;
use idis_core::audit::sink::InMemoryAuditSink;
use idis_core::audit::sink::JsonlFileAuditSink;
use idis_core::core::audit::ActorType;
use idis_core::core::audit::AuditActor;
use idis_core::core::audit::AuditEvent;
use idis_core::core::audit::AuditPayload;
use idis_core::core::audit::AuditRequest;
use idis_core::core::audit::AuditResource;
use idis_core::core::audit::AuditSeverity;
use idis_core::core::audit::HttpMethod;
use idis_core::core::audit::ResourceType;
use idis_core::core::identifiers::ActorId;
use idis_core::core::identifiers::EventId;
use idis_core::core::identifiers::RequestId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::time::Timestamp;
use idis_core::interfaces::AuditSink;
use idis_core::security::context::Role;
use idis_core::security::context::TenantContext;
use idis_core::tooling::FixedClock;
use idis_core::validators::audit_event::validate_audit_event;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Pinned timestamp.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// A well-formed deal.created event.
fn valid_event() -> AuditEvent {
    AuditEvent {
        event_id: EventId::mint(),
        occurred_at: now(),
        tenant_id: TenantId::new("t-1"),
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
            resource_id: "d-1".to_string(),
        },
        event_type: "deal.created".to_string(),
        severity: AuditSeverity::Medium,
        summary: "deal.created via POST /v1/deals".to_string(),
        payload: AuditPayload::default(),
    }
}

/// Tenant context for the guard tests.
fn tenant_context() -> TenantContext {
    TenantContext {
        tenant_id: TenantId::new("t-1"),
        actor_id: ActorId::new("svc-1"),
        name: "Tenant One".to_string(),
        timezone: "UTC".to_string(),
        data_region: "me-south-1".to_string(),
        roles: vec![Role::IntegrationService],
    }
}

/// Pipeline over an in-memory sink.
fn pipeline(sink: &InMemoryAuditSink) -> AuditPipeline {
    AuditPipeline::new(
        Arc::new(sink.clone()),
        Arc::new(FixedClock::at("2026-01-11T12:00:00Z").unwrap()),
    )
}

/// Builder for a createDeal mutation.
fn builder() -> AuditEventBuilder {
    AuditEventBuilder::new(
        tenant_context(),
        RequestId::new("req-1"),
        HttpMethod::Post,
        "/v1/deals",
    )
    .with_client("127.0.0.1", "tests")
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Tests a well-formed event validates.
#[test]
fn test_valid_event_passes() {
    let result = validate_audit_event(&valid_event());
    assert!(result.passed);
}

/// Tests unknown event-type prefixes are rejected.
#[test]
fn test_unknown_prefix_rejected() {
    let mut event = valid_event();
    event.event_type = "mystery.created".to_string();
    let result = validate_audit_event(&event);
    assert!(!result.passed);
    assert!(result.error_codes().contains(&"INVALID_EVENT_TYPE".to_string()));
}

/// Tests every blocklisted payload key is rejected.
#[test]
fn test_redaction_blocklist_rejected() {
    for blocked in ["password", "api_key", "access_token", "private_key"] {
        let mut event = valid_event();
        event
            .payload
            .safe
            .insert(blocked.to_string(), serde_json::Value::String("x".to_string()));
        let result = validate_audit_event(&event);
        assert!(!result.passed, "expected rejection for key {blocked}");
        assert!(result.error_codes().contains(&"REDACTION_VIOLATION".to_string()));
    }
}

/// Tests nested blocklisted keys are found.
#[test]
fn test_nested_redaction_found() {
    let mut event = valid_event();
    event.payload.safe.insert(
        "connector".to_string(),
        json!({"settings": {"secret": "hunter2"}}),
    );
    let result = validate_audit_event(&event);
    assert!(!result.passed);
}

/// Tests partial key matches warn without failing.
#[test]
fn test_partial_match_is_warning() {
    let mut event = valid_event();
    event
        .payload
        .safe
        .insert("token_count".to_string(), serde_json::Value::from(3));
    let result = validate_audit_event(&event);
    assert!(result.passed);
    assert!(!result.warnings.is_empty());
}

// ============================================================================
// SECTION: JSONL Sink
// ============================================================================

/// Tests the file sink writes one canonical JSON line per event.
#[test]
fn test_jsonl_sink_line_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sink = JsonlFileAuditSink::open(&path).unwrap();

    sink.emit(&valid_event()).unwrap();
    sink.emit(&valid_event()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.ends_with('\n'));
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let parsed: AuditEvent = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.event_type, "deal.created");
    }
}

// ============================================================================
// SECTION: Mutation Guard
// ============================================================================

/// Tests a successful mutation emits exactly one matching event.
#[test]
fn test_successful_mutation_emits_event() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let body = json!({"company_name": "Acme"});
    let request = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: None,
        body_hash: body_hash(&body),
    };

    let response = guard
        .execute_mutation(&builder(), &TenantId::new("t-1"), &request, || MutationOutcome {
            status_code: 201,
            resource: Some(AuditResource {
                resource_type: ResourceType::Deal,
                resource_id: "d-1".to_string(),
            }),
            body: json!({"deal_id": "d-1"}),
        })
        .unwrap();

    assert_eq!(response.status_code, 201);
    assert!(!response.idempotency_replay);
    let events = sink.events_with_prefix("deal.created");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].resource.resource_id, "d-1");
}

/// Tests a missing resource id on a 2xx mutation fails closed.
#[test]
fn test_missing_resource_id_fails_closed() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let body = json!({});
    let request = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: None,
        body_hash: body_hash(&body),
    };

    let result =
        guard.execute_mutation(&builder(), &TenantId::new("t-1"), &request, || MutationOutcome {
            status_code: 201,
            resource: None,
            body: json!({}),
        });
    assert!(matches!(result, Err(PipelineError::AuditEmitFailed(_))));
    assert!(sink.events().is_empty());
}

/// Tests 4xx outcomes skip audit entirely.
#[test]
fn test_client_error_skips_audit() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let body = json!({});
    let request = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: None,
        body_hash: body_hash(&body),
    };

    let response = guard
        .execute_mutation(&builder(), &TenantId::new("t-1"), &request, || MutationOutcome {
            status_code: 400,
            resource: None,
            body: json!({"code": "INVALID_REQUEST"}),
        })
        .unwrap();
    assert_eq!(response.status_code, 400);
    assert!(sink.events().is_empty());
}

/// Tests unknown operations cannot mutate successfully.
#[test]
fn test_unknown_operation_fails_closed() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let body = json!({});
    let request = MutationRequest {
        operation_id: "mysteryOperation".to_string(),
        idempotency_key: None,
        body_hash: body_hash(&body),
    };

    let result =
        guard.execute_mutation(&builder(), &TenantId::new("t-1"), &request, || MutationOutcome {
            status_code: 200,
            resource: Some(AuditResource {
                resource_type: ResourceType::Deal,
                resource_id: "d-1".to_string(),
            }),
            body: json!({}),
        });
    assert!(matches!(result, Err(PipelineError::AuditEmitFailed(_))));
}

// ============================================================================
// SECTION: Idempotency
// ============================================================================

/// Tests replaying a key with the same body returns the captured response
/// without a second audit event.
#[test]
fn test_idempotency_replay() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let body = json!({"company_name": "Acme"});
    let request = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: Some("idem-1".to_string()),
        body_hash: body_hash(&body),
    };
    let outcome = || MutationOutcome {
        status_code: 201,
        resource: Some(AuditResource {
            resource_type: ResourceType::Deal,
            resource_id: "d-1".to_string(),
        }),
        body: json!({"deal_id": "d-1"}),
    };

    let first = guard
        .execute_mutation(&builder(), &TenantId::new("t-1"), &request, outcome)
        .unwrap();
    let second = guard
        .execute_mutation(&builder(), &TenantId::new("t-1"), &request, outcome)
        .unwrap();

    assert!(!first.idempotency_replay);
    assert!(second.idempotency_replay);
    assert_eq!(first.body, second.body);
    assert_eq!(sink.events().len(), 1);
}

/// Tests the same key with a different body conflicts.
#[test]
fn test_idempotency_conflict_on_different_body() {
    let sink = InMemoryAuditSink::new();
    let guard = pipeline(&sink);
    let first_body = json!({"company_name": "Acme"});
    let request = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: Some("idem-2".to_string()),
        body_hash: body_hash(&first_body),
    };
    guard
        .execute_mutation(&builder(), &TenantId::new("t-1"), &request, || MutationOutcome {
            status_code: 201,
            resource: Some(AuditResource {
                resource_type: ResourceType::Deal,
                resource_id: "d-1".to_string(),
            }),
            body: json!({"deal_id": "d-1"}),
        })
        .unwrap();

    let changed_body = json!({"company_name": "Other"});
    let replay = MutationRequest {
        operation_id: "createDeal".to_string(),
        idempotency_key: Some("idem-2".to_string()),
        body_hash: body_hash(&changed_body),
    };
    let result =
        guard.execute_mutation(&builder(), &TenantId::new("t-1"), &replay, || MutationOutcome {
            status_code: 201,
            resource: Some(AuditResource {
                resource_type: ResourceType::Deal,
                resource_id: "d-2".to_string(),
            }),
            body: json!({"deal_id": "d-2"}),
        });
    assert!(matches!(result, Err(PipelineError::IdempotencyConflict)));
}
