// idis-core/src/runtime/defects.rs
// ============================================================================
// Module: IDIS Defect Lifecycle
// Description: Waive and cure transitions with mandatory audited reasons.
// Purpose: Keep every defect resolution attributable and fail-closed.
// Dependencies: crate::{core, interfaces, validators}
// ============================================================================

//! ## Overview
//! Waiving or curing a defect requires an actor and a non-empty reason, and
//! each transition is a HIGH-severity audit event that must be accepted
//! before the status change persists. The FATAL invariant is enforced here:
//! no claim may hold a grade better than D while an open FATAL defect exists
//! against it.

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
use crate::core::claim::Claim;
use crate::core::claim::Grade;
use crate::core::defect::Defect;
use crate::core::defect::DefectSeverity;
use crate::core::defect::DefectStatus;
use crate::core::hashing::sha256_hex;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::DefectId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::AuditSink;
use crate::interfaces::DefectRepository;
use crate::interfaces::RepoError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Defect lifecycle failures.
#[derive(Debug, Error)]
pub enum DefectLifecycleError {
    /// Reason was empty.
    #[error("a non-empty reason is required")]
    EmptyReason,
    /// Defect not found in tenant scope.
    #[error("defect not found")]
    NotFound,
    /// Defect is not open.
    #[error("defect is not open")]
    NotOpen,
    /// Mandatory audit could not be emitted; the transition is aborted.
    #[error("defect transition aborted: audit emission failed")]
    AuditEmitFailed,
    /// Persistence failure.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

// ============================================================================
// SECTION: Lifecycle Service
// ============================================================================

/// Waives or cures defects with attributable, audited reasons.
pub struct DefectLifecycle {
    /// Defect persistence.
    defects: Arc<dyn DefectRepository>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl DefectLifecycle {
    /// Creates the lifecycle service.
    #[must_use]
    pub fn new(defects: Arc<dyn DefectRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { defects, audit }
    }

    /// Waives an open defect; emits HIGH `defect.waived`.
    ///
    /// # Errors
    ///
    /// Returns [`DefectLifecycleError`] for empty reasons, unknown or
    /// non-open defects, failed audit emission, or persistence failure.
    #[allow(
        clippy::too_many_arguments,
        reason = "The transition needs the full actor and request context for the audit event."
    )]
    pub fn waive(
        &self,
        tenant_id: &TenantId,
        defect_id: &DefectId,
        actor_id: &ActorId,
        reason: &str,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<Defect, DefectLifecycleError> {
        self.transition(
            tenant_id,
            defect_id,
            actor_id,
            reason,
            request_id,
            now,
            DefectStatus::Waived,
            "defect.waived",
        )
    }

    /// Cures an open defect; emits HIGH `defect.cured`.
    ///
    /// # Errors
    ///
    /// Returns [`DefectLifecycleError`] for empty reasons, unknown or
    /// non-open defects, failed audit emission, or persistence failure.
    #[allow(
        clippy::too_many_arguments,
        reason = "The transition needs the full actor and request context for the audit event."
    )]
    pub fn cure(
        &self,
        tenant_id: &TenantId,
        defect_id: &DefectId,
        actor_id: &ActorId,
        reason: &str,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<Defect, DefectLifecycleError> {
        self.transition(
            tenant_id,
            defect_id,
            actor_id,
            reason,
            request_id,
            now,
            DefectStatus::Cured,
            "defect.cured",
        )
    }

    /// Shared waive/cure transition body.
    #[allow(
        clippy::too_many_arguments,
        reason = "The transition needs the full actor and request context for the audit event."
    )]
    fn transition(
        &self,
        tenant_id: &TenantId,
        defect_id: &DefectId,
        actor_id: &ActorId,
        reason: &str,
        request_id: &RequestId,
        now: Timestamp,
        next_status: DefectStatus,
        event_type: &str,
    ) -> Result<Defect, DefectLifecycleError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(DefectLifecycleError::EmptyReason);
        }
        let mut defect = self
            .defects
            .get(tenant_id, defect_id)?
            .ok_or(DefectLifecycleError::NotFound)?;
        if defect.status != DefectStatus::Open {
            return Err(DefectLifecycleError::NotOpen);
        }

        self.emit_transition_audit(&defect, actor_id, trimmed, event_type, request_id, now)?;

        defect.status = next_status;
        defect.resolved_by = Some(actor_id.clone());
        defect.resolution_reason = Some(trimmed.to_string());
        defect.updated_at = now;
        self.defects.update(&defect)?;
        Ok(defect)
    }

    /// Emits the HIGH transition event; failure aborts the transition.
    fn emit_transition_audit(
        &self,
        defect: &Defect,
        actor_id: &ActorId,
        reason: &str,
        event_type: &str,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<(), DefectLifecycleError> {
        let mut safe = BTreeMap::new();
        safe.insert(
            "reason_len".to_string(),
            serde_json::Value::from(reason.chars().count()),
        );

        let event = AuditEvent {
            event_id: EventId::mint(),
            occurred_at: now,
            tenant_id: defect.tenant_id.clone(),
            actor: AuditActor {
                actor_type: ActorType::Human,
                actor_id: actor_id.clone(),
                roles: vec!["ANALYST".to_string()],
                ip: "unknown".to_string(),
                user_agent: "unknown".to_string(),
            },
            request: AuditRequest {
                request_id: request_id.clone(),
                method: HttpMethod::Post,
                path: format!("/v1/defects/{}", defect.defect_id),
                status_code: 200,
                idempotency_key: None,
            },
            resource: AuditResource {
                resource_type: ResourceType::Defect,
                resource_id: defect.defect_id.to_string(),
            },
            event_type: event_type.to_string(),
            severity: AuditSeverity::High,
            summary: format!("{event_type} on claim {}", defect.claim_id),
            payload: AuditPayload {
                hashes: vec![format!("reason_sha256:{}", sha256_hex(reason))],
                refs: vec![format!("claim:{}", defect.claim_id)],
                safe,
            },
        };
        self.audit
            .emit(&event)
            .map_err(|_| DefectLifecycleError::AuditEmitFailed)
    }
}

// ============================================================================
// SECTION: Invariants
// ============================================================================

/// Enforces the FATAL invariant on a claim.
///
/// Any open FATAL defect against the claim forces its grade to D; the
/// adjusted claim is returned unchanged otherwise.
#[must_use]
pub fn enforce_fatal_invariant(mut claim: Claim, defects: &[Defect]) -> Claim {
    let has_open_fatal = defects.iter().any(|defect| {
        defect.claim_id == claim.claim_id
            && defect.status == DefectStatus::Open
            && defect.severity == DefectSeverity::Fatal
    });
    if has_open_fatal {
        claim.claim_grade = Grade::D;
    }
    claim
}
