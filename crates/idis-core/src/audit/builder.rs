// idis-core/src/audit/builder.rs
// ============================================================================
// Module: IDIS Audit Event Builder
// Description: Builds candidate audit events from request state.
// Purpose: Keep event construction in one place so no route hand-rolls one.
// Dependencies: crate::core::audit, crate::security::context
// ============================================================================

//! ## Overview
//! The builder assembles a candidate event from the tenant context, request
//! metadata, and the resource populated by the route. The operation table
//! maps stable operation identifiers to `(event_type, severity, resource
//! type)` triples; unknown operations produce no event and the pipeline fails
//! the mutation closed rather than inventing one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::audit::ActorType;
use crate::core::audit::AuditActor;
use crate::core::audit::AuditEvent;
use crate::core::audit::AuditPayload;
use crate::core::audit::AuditRequest;
use crate::core::audit::AuditResource;
use crate::core::audit::AuditSeverity;
use crate::core::audit::HttpMethod;
use crate::core::audit::ResourceType;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::time::Timestamp;
use crate::security::context::TenantContext;

// ============================================================================
// SECTION: Operation Table
// ============================================================================

/// Maps a stable operation id to its event type, severity, and resource type.
#[must_use]
pub fn operation_event(operation_id: &str) -> Option<(&'static str, AuditSeverity, ResourceType)> {
    match operation_id {
        "createDeal" => Some(("deal.created", AuditSeverity::Medium, ResourceType::Deal)),
        "updateDeal" => Some(("deal.updated", AuditSeverity::Medium, ResourceType::Deal)),
        "createDealDocument" => {
            Some(("document.created", AuditSeverity::Medium, ResourceType::Document))
        }
        "ingestDocument" => {
            Some(("document.ingestion.started", AuditSeverity::Low, ResourceType::Document))
        }
        "deleteDocument" => {
            Some(("document.deleted", AuditSeverity::Medium, ResourceType::Document))
        }
        "createClaim" => Some(("claim.created", AuditSeverity::Medium, ResourceType::Claim)),
        "updateClaim" => Some(("claim.updated", AuditSeverity::Medium, ResourceType::Claim)),
        "createSanad" => Some(("sanad.created", AuditSeverity::Medium, ResourceType::Sanad)),
        "updateSanad" => Some(("sanad.updated", AuditSeverity::Medium, ResourceType::Sanad)),
        "createDefect" => Some(("defect.created", AuditSeverity::High, ResourceType::Defect)),
        "waiveDefect" => Some(("defect.waived", AuditSeverity::High, ResourceType::Defect)),
        "cureDefect" => Some(("defect.cured", AuditSeverity::High, ResourceType::Defect)),
        "runCalc" => Some(("calc.started", AuditSeverity::Low, ResourceType::Calc)),
        "startRun" => Some(("deal.run.started", AuditSeverity::Low, ResourceType::Deal)),
        "startDebate" => Some(("debate.started", AuditSeverity::Low, ResourceType::Debate)),
        "submitHumanGateAction" => {
            Some(("human_gate.action.submitted", AuditSeverity::Medium, ResourceType::HumanGate))
        }
        "createOverride" => {
            Some(("override.created", AuditSeverity::High, ResourceType::Override))
        }
        "generateDeliverable" => {
            Some(("deliverable.requested", AuditSeverity::Low, ResourceType::Deliverable))
        }
        "createWebhook" => Some(("webhook.created", AuditSeverity::Medium, ResourceType::Webhook)),
        _ => None,
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds candidate audit events from request state.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
    /// Tenant context of the authenticated caller.
    tenant: TenantContext,
    /// Correlation identifier of the request.
    request_id: RequestId,
    /// HTTP method of the request.
    method: HttpMethod,
    /// Request path.
    path: String,
    /// Client IP address.
    ip: String,
    /// Client user agent.
    user_agent: String,
    /// Idempotency key carried by the request, when any.
    idempotency_key: Option<String>,
}

impl AuditEventBuilder {
    /// Creates a builder from the request's authenticated context.
    #[must_use]
    pub fn new(
        tenant: TenantContext,
        request_id: RequestId,
        method: HttpMethod,
        path: impl Into<String>,
    ) -> Self {
        Self {
            tenant,
            request_id,
            method,
            path: path.into(),
            ip: "unknown".to_string(),
            user_agent: "unknown".to_string(),
            idempotency_key: None,
        }
    }

    /// Records the client address and agent.
    #[must_use]
    pub fn with_client(mut self, ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip = ip.into();
        self.user_agent = user_agent.into();
        self
    }

    /// Records the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Builds the event for a completed operation.
    #[must_use]
    pub fn build(
        &self,
        event_type: &str,
        severity: AuditSeverity,
        resource: AuditResource,
        status_code: u16,
        occurred_at: Timestamp,
        payload: AuditPayload,
    ) -> AuditEvent {
        AuditEvent {
            event_id: EventId::mint(),
            occurred_at,
            tenant_id: self.tenant.tenant_id.clone(),
            actor: AuditActor {
                actor_type: ActorType::Service,
                actor_id: self.tenant.actor_id.clone(),
                roles: self.tenant.roles.iter().map(|role| role.as_str().to_string()).collect(),
                ip: self.ip.clone(),
                user_agent: self.user_agent.clone(),
            },
            request: AuditRequest {
                request_id: self.request_id.clone(),
                method: self.method,
                path: self.path.clone(),
                status_code,
                idempotency_key: self.idempotency_key.clone(),
            },
            resource,
            event_type: event_type.to_string(),
            severity,
            summary: format!("{event_type} via {} {}", self.method.as_str(), self.path),
            payload,
        }
    }
}
