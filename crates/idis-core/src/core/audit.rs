// idis-core/src/core/audit.rs
// ============================================================================
// Module: IDIS Audit Event Model
// Description: Append-only audit event records for every mutation.
// Purpose: Provide the validated event shape the fail-closed pipeline emits.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Every mutating operation produces exactly one audit event, validated
//! against a closed schema before emission. An event is either persisted and
//! visible or the mutation that caused it is rolled back. Payloads carry only
//! hashes, references, and explicitly safe fields; the redaction blocklist is
//! enforced by the validator, never bypassed here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Taxonomy
// ============================================================================

/// Closed set of event-type prefixes accepted by the validator.
pub const VALID_EVENT_PREFIXES: [&str; 21] = [
    "deal.",
    "document.",
    "claim.",
    "sanad.",
    "defect.",
    "calc.",
    "debate.",
    "human_gate.",
    "override.",
    "deliverable.",
    "break_glass.",
    "data.",
    "legal_hold.",
    "byok.",
    "graph_projection.",
    "enrichment.",
    "auth.",
    "tenant.",
    "rbac.",
    "webhook.",
    "integration.",
];

/// Additional prefix carried by orchestrator step-ledger events.
///
/// The step ledger emits `run.step.*` transitions; these validate alongside
/// the deal-scoped `deal.run.*` events.
pub const RUN_EVENT_PREFIX: &str = "run.";

/// Event severity ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    /// Routine event.
    Low,
    /// Noteworthy mutation.
    Medium,
    /// Sensitive mutation (defect waivers, overrides).
    High,
    /// Security-critical event (break-glass, legal hold).
    Critical,
}

/// Closed set of auditable resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A deal.
    Deal,
    /// A document.
    Document,
    /// A claim.
    Claim,
    /// A sanad.
    Sanad,
    /// A defect.
    Defect,
    /// A calculation.
    Calc,
    /// A debate.
    Debate,
    /// A deliverable.
    Deliverable,
    /// A human gate.
    HumanGate,
    /// An override.
    Override,
    /// A pipeline run.
    Run,
    /// A legal hold.
    LegalHold,
    /// A BYOK key.
    ByokKey,
    /// An integration.
    Integration,
    /// A webhook.
    Webhook,
}

/// Actor kinds recorded on events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    /// A human user.
    Human,
    /// A service principal.
    Service,
}

/// HTTP methods recorded on events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns true when the method mutates state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Get)
    }

    /// Returns the canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

// ============================================================================
// SECTION: Event Components
// ============================================================================

/// Actor context recorded on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    /// Actor kind.
    pub actor_type: ActorType,
    /// Actor identifier.
    pub actor_id: ActorId,
    /// Roles held at event time.
    pub roles: Vec<String>,
    /// Client IP address.
    pub ip: String,
    /// Client user agent.
    pub user_agent: String,
}

/// Request context recorded on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Correlation identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: String,
    /// Response status code.
    pub status_code: u16,
    /// Idempotency key, when the request carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Resource context recorded on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResource {
    /// Resource type.
    pub resource_type: ResourceType,
    /// Resource identifier.
    pub resource_id: String,
}

/// Sanitized payload carried on an event.
///
/// # Invariants
/// - No key in `safe` may match the redaction blocklist.
/// - `hashes` carry digests, never raw secrets or bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuditPayload {
    /// Content digests referenced by the event.
    #[serde(default)]
    pub hashes: Vec<String>,
    /// Entity references.
    #[serde(default)]
    pub refs: Vec<String>,
    /// Explicitly safe structured fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub safe: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// One append-only audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Server-side occurrence timestamp.
    pub occurred_at: Timestamp,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Actor context.
    pub actor: AuditActor,
    /// Request context.
    pub request: AuditRequest,
    /// Resource context.
    pub resource: AuditResource,
    /// Event type, prefix-validated against the taxonomy.
    pub event_type: String,
    /// Severity.
    pub severity: AuditSeverity,
    /// Human-readable summary.
    pub summary: String,
    /// Sanitized payload.
    #[serde(default)]
    pub payload: AuditPayload,
}
