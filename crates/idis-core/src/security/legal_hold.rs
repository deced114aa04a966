// idis-core/src/security/legal_hold.rs
// ============================================================================
// Module: IDIS Legal Hold & Retention
// Description: Deletion blocking and retention-class evaluation.
// Purpose: Keep held data undeletable and retention decisions auditable.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A legal hold on a deal, document, or artifact blocks every deletion path
//! regardless of retention class. Applying or lifting a hold requires a
//! non-empty reason; the reason's SHA-256 and length are audited with
//! CRITICAL severity, the reason text never. Retention classes: raw
//! documents are kept indefinitely, deliverables and audit events for 2555
//! days; deliverables may be hard-deleted with admin approval, audit events
//! never.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
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
use crate::core::envelope::codes;
use crate::core::hashing::sha256_hex;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::HoldId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::AuditSink;
use crate::validators::audit_event::validate_audit_event;

// ============================================================================
// SECTION: Retention Model
// ============================================================================

/// Entities a hold can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldTarget {
    /// A deal and everything under it.
    Deal,
    /// A single document.
    Document,
    /// An exported artifact.
    Artifact,
}

/// Retention period classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetentionClass {
    /// Raw ingested documents; retained indefinitely.
    RawDocuments,
    /// Exported deliverables; 2555 days, admin-deletable.
    Deliverables,
    /// Audit events; 2555 days, never hard-deletable.
    AuditEvents,
}

/// Retention period for deliverables and audit events, in days.
pub const RETENTION_DAYS: i64 = 2555;

/// Outcome of a retention evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetentionDecision {
    /// Still inside the retention window; keep.
    Retain,
    /// Outside the window and eligible for deletion.
    Deletable,
    /// Outside the window but deletion needs admin approval.
    RequiresAdminApproval,
    /// Never deletable.
    NeverDeletable,
}

/// Evaluates whether an entity of a retention class may be deleted.
#[must_use]
pub fn evaluate_retention(
    retention_class: RetentionClass,
    created_at: Timestamp,
    now: Timestamp,
    admin_approved: bool,
) -> RetentionDecision {
    match retention_class {
        RetentionClass::RawDocuments => RetentionDecision::Retain,
        RetentionClass::AuditEvents => RetentionDecision::NeverDeletable,
        RetentionClass::Deliverables => {
            let age_days = (now.unix_seconds() - created_at.unix_seconds()) / 86_400;
            if age_days < RETENTION_DAYS {
                RetentionDecision::Retain
            } else if admin_approved {
                RetentionDecision::Deletable
            } else {
                RetentionDecision::RequiresAdminApproval
            }
        }
    }
}

// ============================================================================
// SECTION: Hold Model
// ============================================================================

/// An active or lifted legal hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalHold {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Target entity type.
    pub target_type: HoldTarget,
    /// Target entity identifier.
    pub target_id: String,
    /// SHA-256 of the recorded reason.
    pub reason_hash: String,
    /// Actor who applied the hold.
    pub applied_by: ActorId,
    /// Application timestamp.
    pub applied_at: Timestamp,
    /// Lift timestamp; `None` while active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifted_at: Option<Timestamp>,
}

impl LegalHold {
    /// Returns true while the hold is in force.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.lifted_at.is_none()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Legal-hold failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HoldError {
    /// Reason was empty.
    #[error("a non-empty reason is required")]
    EmptyReason,
    /// Hold not found in tenant scope.
    #[error("hold not found")]
    NotFound,
    /// Deletion blocked by an active hold.
    #[error("Access denied")]
    DeletionBlocked,
    /// Mandatory audit could not be emitted.
    #[error("legal hold operation aborted: audit emission failed")]
    AuditEmitFailed,
}

impl HoldError {
    /// Returns the stable envelope code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DeletionBlocked => codes::DELETION_BLOCKED_BY_HOLD,
            Self::AuditEmitFailed => codes::AUDIT_EMIT_FAILED,
            Self::EmptyReason => codes::INVALID_REQUEST,
            Self::NotFound => codes::NOT_FOUND,
        }
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// In-process legal-hold registry.
#[derive(Debug, Default)]
pub struct LegalHoldRegistry {
    /// Holds keyed by hold id.
    holds: Mutex<BTreeMap<HoldId, LegalHold>>,
}

impl LegalHoldRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a hold; emits a CRITICAL `legal_hold.applied` audit event.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::EmptyReason`] for blank reasons and
    /// [`HoldError::AuditEmitFailed`] when emission fails.
    #[allow(
        clippy::too_many_arguments,
        reason = "Hold creation needs the full actor and request context for the audit event."
    )]
    pub fn apply_hold(
        &self,
        sink: &dyn AuditSink,
        tenant_id: &TenantId,
        target_type: HoldTarget,
        target_id: &str,
        reason: &str,
        actor_id: &ActorId,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<LegalHold, HoldError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(HoldError::EmptyReason);
        }
        let hold = LegalHold {
            hold_id: HoldId::mint(),
            tenant_id: tenant_id.clone(),
            target_type,
            target_id: target_id.to_string(),
            reason_hash: sha256_hex(trimmed),
            applied_by: actor_id.clone(),
            applied_at: now,
            lifted_at: None,
        };
        emit_hold_audit(sink, &hold, trimmed, "legal_hold.applied", request_id, now)?;
        if let Ok(mut guard) = self.holds.lock() {
            guard.insert(hold.hold_id.clone(), hold.clone());
        }
        Ok(hold)
    }

    /// Lifts a hold; emits a CRITICAL `legal_hold.lifted` audit event.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::NotFound`] for unknown or cross-tenant holds,
    /// [`HoldError::EmptyReason`] for blank reasons, and
    /// [`HoldError::AuditEmitFailed`] when emission fails.
    #[allow(
        clippy::too_many_arguments,
        reason = "Hold lifting needs the full actor and request context for the audit event."
    )]
    pub fn lift_hold(
        &self,
        sink: &dyn AuditSink,
        tenant_id: &TenantId,
        hold_id: &HoldId,
        reason: &str,
        actor_id: &ActorId,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<LegalHold, HoldError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(HoldError::EmptyReason);
        }
        let mut hold = self
            .holds
            .lock()
            .ok()
            .and_then(|guard| guard.get(hold_id).cloned())
            .filter(|hold| &hold.tenant_id == tenant_id)
            .ok_or(HoldError::NotFound)?;
        hold.lifted_at = Some(now);
        let mut lifted = hold.clone();
        lifted.applied_by = actor_id.clone();
        emit_hold_audit(sink, &lifted, trimmed, "legal_hold.lifted", request_id, now)?;
        if let Ok(mut guard) = self.holds.lock() {
            guard.insert(hold.hold_id.clone(), hold.clone());
        }
        Ok(hold)
    }

    /// Returns true when an active hold covers the target.
    #[must_use]
    pub fn has_active_hold(
        &self,
        tenant_id: &TenantId,
        target_type: HoldTarget,
        target_id: &str,
    ) -> bool {
        self.holds
            .lock()
            .map(|guard| {
                guard.values().any(|hold| {
                    hold.is_active()
                        && &hold.tenant_id == tenant_id
                        && hold.target_type == target_type
                        && hold.target_id == target_id
                })
            })
            .unwrap_or(false)
    }

    /// Blocks a deletion path when an active hold covers the target.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::DeletionBlocked`] when an active hold exists.
    pub fn block_deletion_if_held(
        &self,
        tenant_id: &TenantId,
        target_type: HoldTarget,
        target_id: &str,
    ) -> Result<(), HoldError> {
        if self.has_active_hold(tenant_id, target_type, target_id) {
            Err(HoldError::DeletionBlocked)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Emits a CRITICAL hold lifecycle event carrying only the reason hash.
fn emit_hold_audit(
    sink: &dyn AuditSink,
    hold: &LegalHold,
    reason: &str,
    event_type: &str,
    request_id: &RequestId,
    now: Timestamp,
) -> Result<(), HoldError> {
    let mut safe = BTreeMap::new();
    safe.insert(
        "reason_len".to_string(),
        serde_json::Value::from(reason.chars().count()),
    );
    safe.insert(
        "target_type".to_string(),
        serde_json::to_value(hold.target_type).unwrap_or(serde_json::Value::Null),
    );

    let event = AuditEvent {
        event_id: EventId::mint(),
        occurred_at: now,
        tenant_id: hold.tenant_id.clone(),
        actor: AuditActor {
            actor_type: ActorType::Human,
            actor_id: hold.applied_by.clone(),
            roles: vec!["ADMIN".to_string()],
            ip: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        },
        request: AuditRequest {
            request_id: request_id.clone(),
            method: HttpMethod::Post,
            path: "/v1/legal-holds".to_string(),
            status_code: 200,
            idempotency_key: None,
        },
        resource: AuditResource {
            resource_type: ResourceType::LegalHold,
            resource_id: hold.hold_id.to_string(),
        },
        event_type: event_type.to_string(),
        severity: AuditSeverity::Critical,
        summary: format!("{event_type} on {}", hold.target_id),
        payload: AuditPayload {
            hashes: vec![format!("reason_sha256:{}", sha256_hex(reason))],
            refs: vec![format!("target:{}", hold.target_id)],
            safe,
        },
    };

    let validation = validate_audit_event(&event);
    if !validation.passed {
        return Err(HoldError::AuditEmitFailed);
    }
    sink.emit(&event).map_err(|_| HoldError::AuditEmitFailed)
}
