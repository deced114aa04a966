// idis-core/src/core/envelope.rs
// ============================================================================
// Module: IDIS Error Envelope
// Description: The single wire shape for every error response.
// Purpose: Keep error codes stable and responses free of internals.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Every layer returns typed failures; the transport boundary renders them
//! through this one envelope builder. Messages stay short and generic,
//! machine-readable diagnostics go in `details`, and the redaction blocklist
//! applies to `details` exactly as it does to audit payloads. Stack traces
//! never appear in a response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RequestId;

// ============================================================================
// SECTION: Stable Codes
// ============================================================================

/// Stable error codes shared across the /v1 surface.
pub mod codes {
    /// Authentication failed or missing.
    pub const UNAUTHORIZED: &str = "unauthorized";
    /// Resource does not exist in the caller's tenant scope.
    pub const NOT_FOUND: &str = "not_found";
    /// Request failed schema validation.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// Request body is not valid JSON.
    pub const INVALID_JSON: &str = "INVALID_JSON";
    /// Pagination limit out of range.
    pub const INVALID_LIMIT: &str = "INVALID_LIMIT";
    /// Pagination cursor unparsable.
    pub const INVALID_CURSOR: &str = "INVALID_CURSOR";
    /// Audit event could not be validated or emitted.
    pub const AUDIT_EMIT_FAILED: &str = "AUDIT_EMIT_FAILED";
    /// Tenant region does not match the service region.
    pub const RESIDENCY_REGION_MISMATCH: &str = "RESIDENCY_REGION_MISMATCH";
    /// Service region is not configured.
    pub const RESIDENCY_SERVICE_REGION_UNSET: &str = "RESIDENCY_SERVICE_REGION_UNSET";
    /// Tenant key is revoked for protected data classes.
    pub const BYOK_KEY_REVOKED: &str = "BYOK_KEY_REVOKED";
    /// Deletion blocked by an active legal hold.
    pub const DELETION_BLOCKED_BY_HOLD: &str = "DELETION_BLOCKED_BY_HOLD";
    /// Role matrix denied the operation.
    pub const RBAC_DENIED: &str = "RBAC_DENIED";
    /// Claim-to-deal resolution infrastructure unavailable.
    pub const ABAC_RESOLUTION_FAILED: &str = "ABAC_RESOLUTION_FAILED";
    /// Idempotency key replayed with a different body.
    pub const IDEMPOTENCY_CONFLICT: &str = "IDEMPOTENCY_CONFLICT";
    /// No-Free-Facts validation failed on a deliverable.
    pub const NO_FREE_FACTS_VIOLATION: &str = "NO_FREE_FACTS_VIOLATION";
    /// Deliverable validation failed before export.
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// The single error envelope returned by every failing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Stable machine-readable code.
    pub code: String,
    /// Short, generic message.
    pub message: String,
    /// Structured diagnostics; subject to the redaction blocklist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Correlation identifier for the failing request.
    pub request_id: RequestId,
}

impl ErrorEnvelope {
    /// Builds an envelope with no details.
    #[must_use]
    pub fn new(code: &str, message: &str, request_id: RequestId) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id,
        }
    }

    /// Attaches structured diagnostics.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
