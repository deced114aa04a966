// idis-core/src/validators/audit_event.rs
// ============================================================================
// Module: IDIS Audit Event Validator
// Description: Enforces the closed event schema and the redaction policy.
// Purpose: Keep secrets out of the append-only log, fail closed on gaps.
// Dependencies: crate::core::audit, serde_json
// ============================================================================

//! ## Overview
//! Audit events are append-only and must be emitted for every mutating
//! operation, so the validator is strict: the event-type prefix must come
//! from the closed taxonomy, required fields must be non-empty, and no key in
//! the payload may match the redaction blocklist. Blocklist violations are
//! errors; partial key matches are surfaced as warnings for review.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::audit::AuditEvent;
use crate::core::audit::RUN_EVENT_PREFIX;
use crate::core::audit::VALID_EVENT_PREFIXES;
use crate::validators::ValidationIssue;
use crate::validators::ValidationResult;

// ============================================================================
// SECTION: Redaction Policy
// ============================================================================

/// Payload keys that must never appear in an audit event.
pub const REDACTION_BLOCKLIST: [&str; 12] = [
    "password",
    "secret",
    "api_key",
    "apikey",
    "token",
    "access_token",
    "refresh_token",
    "ssn",
    "social_security",
    "credit_card",
    "bank_account",
    "private_key",
];

/// Walks a JSON value collecting redaction findings.
fn check_redaction(value: &Value, path: &str, errors: &mut Vec<ValidationIssue>, warnings: &mut Vec<ValidationIssue>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key_lower = key.to_ascii_lowercase();
                let child_path = format!("{path}.{key}");
                if REDACTION_BLOCKLIST.contains(&key_lower.as_str()) {
                    errors.push(ValidationIssue::new(
                        "REDACTION_VIOLATION",
                        format!(
                            "sensitive field '{key}' must not appear in an audit payload; \
                             store a hash or reference instead"
                        ),
                        child_path.clone(),
                    ));
                } else if let Some(blocked) =
                    REDACTION_BLOCKLIST.iter().find(|blocked| key_lower.contains(*blocked))
                {
                    warnings.push(ValidationIssue::new(
                        "REDACTION_WARNING",
                        format!("field '{key}' may contain sensitive data (matches '{blocked}')"),
                        child_path.clone(),
                    ));
                }
                check_redaction(child, &child_path, errors, warnings);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                check_redaction(item, &format!("{path}[{index}]"), errors, warnings);
            }
        }
        _ => {}
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validates an audit event against the closed schema and redaction policy.
#[must_use]
pub fn validate_audit_event(event: &AuditEvent) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if event.event_id.as_str().is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_EVENT_ID",
            "event_id is required",
            "$.event_id",
        ));
    }
    if event.tenant_id.as_str().is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_TENANT_ID",
            "tenant_id is required for tenant isolation",
            "$.tenant_id",
        ));
    }
    if event.event_type.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_EVENT_TYPE",
            "event_type is required",
            "$.event_type",
        ));
    } else {
        let valid_prefix = VALID_EVENT_PREFIXES
            .iter()
            .any(|prefix| event.event_type.starts_with(prefix))
            || event.event_type.starts_with(RUN_EVENT_PREFIX);
        if !valid_prefix {
            errors.push(ValidationIssue::new(
                "INVALID_EVENT_TYPE",
                format!("event type '{}' does not match the taxonomy", event.event_type),
                "$.event_type",
            ));
        }
    }
    if event.summary.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_SUMMARY",
            "summary is required",
            "$.summary",
        ));
    }
    if event.actor.actor_id.as_str().is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_ACTOR_ID",
            "actor.actor_id is required",
            "$.actor.actor_id",
        ));
    }
    if event.request.request_id.as_str().is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_REQUEST_ID",
            "request.request_id is required for correlation",
            "$.request.request_id",
        ));
    }
    if event.request.path.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_PATH",
            "request.path is required",
            "$.request.path",
        ));
    }
    if event.request.status_code < 100 || event.request.status_code > 599 {
        errors.push(ValidationIssue::new(
            "INVALID_STATUS_CODE",
            format!("invalid status_code: {}", event.request.status_code),
            "$.request.status_code",
        ));
    }
    if event.resource.resource_id.is_empty() {
        errors.push(ValidationIssue::new(
            "MISSING_RESOURCE_ID",
            "resource.resource_id is required",
            "$.resource.resource_id",
        ));
    }

    let payload =
        serde_json::to_value(&event.payload).unwrap_or(Value::Null);
    check_redaction(&payload, "$.payload", &mut errors, &mut warnings);

    if errors.is_empty() {
        ValidationResult::success_with_warnings(warnings)
    } else {
        ValidationResult::fail(errors)
    }
}
