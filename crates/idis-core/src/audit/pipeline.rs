// idis-core/src/audit/pipeline.rs
// ============================================================================
// Module: IDIS Audit Mutation Guard
// Description: Fail-closed wrapper around every mutating operation.
// Purpose: Couple mutation success to validated audit emission.
// Dependencies: crate::{audit, core, interfaces, security, validators}
// ============================================================================

//! ## Overview
//! Every mutating operation on the /v1 surface passes through this guard:
//! the mutation runs, a candidate event is built from its outcome, validated,
//! and emitted. A missing resource id on a 2xx outcome, a validation failure,
//! or a sink error each abort the response with `AUDIT_EMIT_FAILED`. Events
//! for 4xx outcomes are skipped (nothing mutated); 5xx outcomes emit on a
//! best-effort basis. Requests replayed under an idempotency key return the
//! captured first response without re-auditing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::audit::builder::AuditEventBuilder;
use crate::audit::builder::operation_event;
use crate::core::audit::AuditPayload;
use crate::core::audit::AuditResource;
use crate::core::envelope::codes;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::TenantId;
use crate::interfaces::AuditSink;
use crate::interfaces::AuditSinkError;
use crate::interfaces::Clock;
use crate::validators::audit_event::validate_audit_event;

// ============================================================================
// SECTION: Mutation Types
// ============================================================================

/// A mutation request presented to the guard.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    /// Stable operation identifier (`createDeal`, `waiveDefect`, …).
    pub operation_id: String,
    /// Idempotency key, when the caller supplied one.
    pub idempotency_key: Option<String>,
    /// Canonical hash of the request body.
    pub body_hash: HashDigest,
}

/// Outcome reported by the wrapped mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// Response status code.
    pub status_code: u16,
    /// Mutated resource, populated by the route.
    pub resource: Option<AuditResource>,
    /// Response body rendered for the caller.
    pub body: serde_json::Value,
}

/// Response returned by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResponse {
    /// Response status code.
    pub status_code: u16,
    /// Response body.
    pub body: serde_json::Value,
    /// True when this response was replayed from the idempotency store.
    pub idempotency_replay: bool,
}

/// Guard failures surfaced to the transport boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Event could not be built, validated, or emitted.
    #[error("audit emission failed: {0}")]
    AuditEmitFailed(String),
    /// Idempotency key replayed with a different body.
    #[error("idempotency key replayed with a different request body")]
    IdempotencyConflict,
}

impl PipelineError {
    /// Returns the stable envelope code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuditEmitFailed(_) => codes::AUDIT_EMIT_FAILED,
            Self::IdempotencyConflict => codes::IDEMPOTENCY_CONFLICT,
        }
    }
}

/// Captured first response for idempotency replay.
#[derive(Debug, Clone)]
struct CapturedResponse {
    /// Hash of the original request body.
    body_hash: HashDigest,
    /// Original response status.
    status_code: u16,
    /// Original response body.
    body: serde_json::Value,
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Fail-closed audit guard around mutating operations.
pub struct AuditPipeline {
    /// Configured sink.
    sink: Arc<dyn AuditSink>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Captured responses keyed by `(tenant, idempotency key)`.
    replays: Mutex<BTreeMap<(TenantId, String), CapturedResponse>>,
}

impl AuditPipeline {
    /// Creates a pipeline over a sink and clock.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            clock,
            replays: Mutex::new(BTreeMap::new()),
        }
    }

    /// Executes a mutation under the fail-closed audit contract.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AuditEmitFailed`] when the event cannot be
    /// built, validated, or emitted for a non-4xx outcome, and
    /// [`PipelineError::IdempotencyConflict`] when a replayed key carries a
    /// different body.
    pub fn execute_mutation<F>(
        &self,
        builder: &AuditEventBuilder,
        tenant_id: &TenantId,
        request: &MutationRequest,
        mutation: F,
    ) -> Result<MutationResponse, PipelineError>
    where
        F: FnOnce() -> MutationOutcome,
    {
        if let Some(key) = &request.idempotency_key
            && let Some(captured) = self.lookup_replay(tenant_id, key)
        {
            if captured.body_hash != request.body_hash {
                return Err(PipelineError::IdempotencyConflict);
            }
            return Ok(MutationResponse {
                status_code: captured.status_code,
                body: captured.body,
                idempotency_replay: true,
            });
        }

        let outcome = mutation();

        // 4xx outcomes mutated nothing; skip audit entirely.
        if (400..500).contains(&outcome.status_code) {
            return Ok(MutationResponse {
                status_code: outcome.status_code,
                body: outcome.body,
                idempotency_replay: false,
            });
        }

        let best_effort = outcome.status_code >= 500;
        match self.emit_for_outcome(builder, request, &outcome) {
            Ok(()) => {}
            Err(err) if best_effort => {
                tracing::warn!(error = %err, "best-effort audit emission failed for 5xx outcome");
            }
            Err(err) => return Err(err),
        }

        if let Some(key) = &request.idempotency_key {
            self.capture_replay(tenant_id, key, request, &outcome);
        }

        Ok(MutationResponse {
            status_code: outcome.status_code,
            body: outcome.body,
            idempotency_replay: false,
        })
    }

    /// Builds, validates, and emits the event for a mutation outcome.
    fn emit_for_outcome(
        &self,
        builder: &AuditEventBuilder,
        request: &MutationRequest,
        outcome: &MutationOutcome,
    ) -> Result<(), PipelineError> {
        let Some((event_type, severity, resource_type)) = operation_event(&request.operation_id)
        else {
            return Err(PipelineError::AuditEmitFailed(format!(
                "operation '{}' is not auditable",
                request.operation_id
            )));
        };

        let resource = match &outcome.resource {
            Some(resource) => resource.clone(),
            // A successful mutation without a resource id is fail-closed:
            // never fabricate an identifier.
            None if outcome.status_code < 400 => {
                return Err(PipelineError::AuditEmitFailed(
                    "resource id missing for successful mutation".to_string(),
                ));
            }
            None => AuditResource {
                resource_type,
                resource_id: "unknown".to_string(),
            },
        };

        let payload = AuditPayload {
            hashes: vec![format!("body_sha256:{}", request.body_hash)],
            refs: Vec::new(),
            safe: BTreeMap::new(),
        };

        let event = builder.build(
            event_type,
            severity,
            resource,
            outcome.status_code,
            self.clock.now(),
            payload,
        );

        let validation = validate_audit_event(&event);
        if !validation.passed {
            return Err(PipelineError::AuditEmitFailed(format!(
                "audit event validation failed: {}",
                validation.error_codes().join(", ")
            )));
        }

        self.sink.emit(&event).map_err(|err: AuditSinkError| {
            PipelineError::AuditEmitFailed(err.to_string())
        })
    }

    /// Looks up a captured response for replay.
    fn lookup_replay(&self, tenant_id: &TenantId, key: &str) -> Option<CapturedResponse> {
        self.replays
            .lock()
            .ok()
            .and_then(|guard| guard.get(&(tenant_id.clone(), key.to_string())).cloned())
    }

    /// Captures the first response under an idempotency key.
    fn capture_replay(
        &self,
        tenant_id: &TenantId,
        key: &str,
        request: &MutationRequest,
        outcome: &MutationOutcome,
    ) {
        if let Ok(mut guard) = self.replays.lock() {
            guard.insert(
                (tenant_id.clone(), key.to_string()),
                CapturedResponse {
                    body_hash: request.body_hash.clone(),
                    status_code: outcome.status_code,
                    body: outcome.body.clone(),
                },
            );
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Hashes a request body for idempotency comparison and audit payloads.
#[must_use]
pub fn body_hash(body: &serde_json::Value) -> HashDigest {
    hash_canonical_json(body).unwrap_or_else(|_| HashDigest::from_bytes(&[]))
}
