// idis-core/tests/break_glass.rs
// ============================================================================
// Module: Break-Glass Tests
// Description: Token issuance, strict validation, and fail-closed audit.
// ============================================================================
//! ## Overview
//! Validates the signed-token round trip, every binding check, strict
//! expiry, and the CRITICAL audit event that carries only hashes.

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

use idis_core::audit::sink::InMemoryAuditSink;
use idis_core::core::audit::AuditResource;
use idis_core::core::audit::AuditSeverity;
use idis_core::core::audit::HttpMethod;
use idis_core::core::audit::ResourceType;
use idis_core::core::identifiers::ActorId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::RequestId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::time::Timestamp;
use idis_core::security::break_glass::BreakGlassError;
use idis_core::security::break_glass::emit_break_glass_audit;
use idis_core::security::break_glass::issue_break_glass_token;
use idis_core::security::break_glass::validate_break_glass_token;
use idis_core::tooling::FailingAuditSink;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Shared signing secret.
const SECRET: &[u8] = b"test-break-glass-secret";
/// Justification above the 20-character minimum.
const JUSTIFICATION: &str = "Urgent IC review of the unassigned deal";

/// Pinned issuance instant.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// Issues a deal-scoped token for the default actor/tenant.
fn issue() -> String {
    issue_break_glass_token(
        SECRET,
        &ActorId::new("admin-1"),
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        JUSTIFICATION,
        900,
        now(),
    )
    .unwrap()
}

// ============================================================================
// SECTION: Issuance and Validation
// ============================================================================

/// Tests issue-then-validate round trips the bindings.
#[test]
fn test_issue_validate_round_trip() {
    let raw = issue();
    let token = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    )
    .unwrap();
    assert_eq!(token.tenant_id, TenantId::new("t-1"));
    assert_eq!(token.deal_id, Some(DealId::new("d-1")));
    assert_eq!(token.justification, JUSTIFICATION);
    assert_eq!(token.exp - token.iat, 900);
}

/// Tests short justifications are rejected at issuance.
#[test]
fn test_short_justification_rejected() {
    let result = issue_break_glass_token(
        SECRET,
        &ActorId::new("admin-1"),
        &TenantId::new("t-1"),
        None,
        "too short",
        900,
        now(),
    );
    assert!(matches!(result, Err(BreakGlassError::InvalidJustification)));
}

/// Tests strict expiry: one second past exp is rejected.
#[test]
fn test_expired_token_rejected() {
    let raw = issue();
    let after_expiry = Timestamp::parse("2026-01-11T12:15:01Z").unwrap();
    let result = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        after_expiry,
    );
    assert!(matches!(result, Err(BreakGlassError::Expired)));
}

/// Tests lifetimes clamp to the one-hour maximum.
#[test]
fn test_duration_clamped_to_max() {
    let raw = issue_break_glass_token(
        SECRET,
        &ActorId::new("admin-1"),
        &TenantId::new("t-1"),
        None,
        JUSTIFICATION,
        86_400,
        now(),
    )
    .unwrap();
    let token = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        None,
        &ActorId::new("admin-1"),
        now(),
    )
    .unwrap();
    assert_eq!(token.exp - token.iat, 3600);
}

/// Tests tenant, deal, and actor binding mismatches each reject.
#[test]
fn test_binding_mismatches_rejected() {
    let raw = issue();

    let wrong_tenant = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-other"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    );
    assert!(matches!(wrong_tenant, Err(BreakGlassError::TenantMismatch)));

    let wrong_deal = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-other")),
        &ActorId::new("admin-1"),
        now(),
    );
    assert!(matches!(wrong_deal, Err(BreakGlassError::DealMismatch)));

    let wrong_actor = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-2"),
        now(),
    );
    assert!(matches!(wrong_actor, Err(BreakGlassError::ActorMismatch)));
}

/// Tests tampering with the token body invalidates the signature.
#[test]
fn test_tampered_token_rejected() {
    let raw = issue();
    let mut tampered = raw.clone();
    // Flip one character of the Base64 body.
    let replacement = if tampered.starts_with('A') { "B" } else { "A" };
    tampered.replace_range(0..1, replacement);

    let result = validate_break_glass_token(
        &tampered,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    );
    assert!(result.is_err());
}

/// Tests a wrong secret fails signature verification.
#[test]
fn test_wrong_secret_rejected() {
    let raw = issue();
    let result = validate_break_glass_token(
        &raw,
        b"a-different-secret",
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    );
    assert!(matches!(result, Err(BreakGlassError::InvalidSignature)));
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Tests the CRITICAL audit event carries hashes, never raw values.
#[test]
fn test_audit_event_carries_only_hashes() {
    let raw = issue();
    let token = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    )
    .unwrap();

    let sink = InMemoryAuditSink::new();
    emit_break_glass_audit(
        &sink,
        &token,
        &raw,
        &RequestId::new("req-1"),
        HttpMethod::Get,
        "/v1/deals/d-1",
        AuditResource {
            resource_type: ResourceType::Deal,
            resource_id: "d-1".to_string(),
        },
        "getDeal",
        now(),
    )
    .unwrap();

    let events = sink.events_with_prefix("break_glass.used");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.severity, AuditSeverity::Critical);
    assert!(event.payload.hashes.iter().any(|hash| hash.starts_with("token_sha256:")));
    assert!(
        event
            .payload
            .hashes
            .iter()
            .any(|hash| hash.starts_with("justification_sha256:"))
    );
    let serialized = serde_json::to_string(event).unwrap();
    assert!(!serialized.contains(JUSTIFICATION));
    assert!(!serialized.contains(&raw));
}

/// Tests audit emission failure denies the override.
#[test]
fn test_audit_failure_denies_override() {
    let raw = issue();
    let token = validate_break_glass_token(
        &raw,
        SECRET,
        &TenantId::new("t-1"),
        Some(&DealId::new("d-1")),
        &ActorId::new("admin-1"),
        now(),
    )
    .unwrap();

    let result = emit_break_glass_audit(
        &FailingAuditSink::new(),
        &token,
        &raw,
        &RequestId::new("req-1"),
        HttpMethod::Get,
        "/v1/deals/d-1",
        AuditResource {
            resource_type: ResourceType::Deal,
            resource_id: "d-1".to_string(),
        },
        "getDeal",
        now(),
    );
    assert!(matches!(result, Err(BreakGlassError::AuditEmitFailed)));
}
