// idis-core/src/security/break_glass.rs
// ============================================================================
// Module: IDIS Break-Glass Override
// Description: Time-bound, signed admin override of deal-level ABAC.
// Purpose: Issue, validate, and audit break-glass tokens fail-closed.
// Dependencies: hmac, sha2, base64, serde_jcs, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A break-glass token is URL-safe Base64 of a canonical JSON payload with an
//! HMAC-SHA256 signature computed over the payload without its `sig` field.
//! Tokens bind actor, tenant, optional deal, a justification of at least 20
//! characters, and a lifetime capped at one hour. Validation is strict on
//! every binding, and the CRITICAL `break_glass.used` audit event carries
//! only the SHA-256 hashes of the token and justification, never the raw
//! values. If that event cannot be emitted, the override is denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::core::audit::ActorType;
use crate::core::audit::AuditActor;
use crate::core::audit::AuditEvent;
use crate::core::audit::AuditPayload;
use crate::core::audit::AuditRequest;
use crate::core::audit::AuditResource;
use crate::core::audit::AuditSeverity;
use crate::core::audit::HttpMethod;
use crate::core::hashing::sha256_hex;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::AuditSink;
use crate::security::context::Role;
use crate::validators::audit_event::validate_audit_event;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum token lifetime in seconds.
pub const MAX_DURATION_SECONDS: i64 = 3600;
/// Default token lifetime in seconds.
pub const DEFAULT_DURATION_SECONDS: i64 = 900;
/// Minimum lifetime granted to any token.
const MIN_DURATION_SECONDS: i64 = 60;
/// Minimum justification length after trimming.
pub const MIN_JUSTIFICATION_LENGTH: usize = 20;

// ============================================================================
// SECTION: Token Payload
// ============================================================================

/// Signed claims carried by a break-glass token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakGlassToken {
    /// Unique identifier of this break-glass session.
    pub token_id: String,
    /// Actor the token is bound to.
    pub actor_id: ActorId,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Deal scope, or `None` for tenant-wide access.
    pub deal_id: Option<DealId>,
    /// Required justification text.
    pub justification: String,
    /// Issued-at unix seconds.
    pub iat: i64,
    /// Expiry unix seconds; strict.
    pub exp: i64,
}

/// Wire form of the token payload, including the signature.
#[derive(Debug, Serialize, Deserialize)]
struct WireToken {
    /// Unique token identifier.
    token_id: String,
    /// Bound actor.
    actor_id: String,
    /// Tenant scope.
    tenant_id: String,
    /// Optional deal scope.
    deal_id: Option<String>,
    /// Justification text.
    justification: String,
    /// Issued-at unix seconds.
    iat: i64,
    /// Expiry unix seconds.
    exp: i64,
    /// Hex HMAC-SHA256 over the canonical payload without this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sig: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Break-glass issuance and validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakGlassError {
    /// Signing secret is not configured.
    #[error("break-glass not configured")]
    NotConfigured,
    /// Justification shorter than the minimum.
    #[error("justification must be at least {MIN_JUSTIFICATION_LENGTH} characters")]
    InvalidJustification,
    /// Token is malformed or undecodable.
    #[error("malformed break-glass token")]
    Malformed,
    /// Signature verification failed.
    #[error("invalid break-glass token signature")]
    InvalidSignature,
    /// Token expired.
    #[error("break-glass token has expired")]
    Expired,
    /// Tenant binding mismatch.
    #[error("break-glass token tenant mismatch")]
    TenantMismatch,
    /// Deal binding mismatch.
    #[error("break-glass token deal mismatch")]
    DealMismatch,
    /// Actor binding mismatch.
    #[error("break-glass token actor mismatch")]
    ActorMismatch,
    /// The mandatory audit event could not be emitted.
    #[error("break-glass denied: audit emission failed")]
    AuditEmitFailed,
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Computes the hex HMAC-SHA256 signature over the canonical payload.
fn sign_payload(payload: &WireToken, secret: &[u8]) -> Result<String, BreakGlassError> {
    let canonical =
        serde_jcs::to_vec(payload).map_err(|_| BreakGlassError::Malformed)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|_| BreakGlassError::NotConfigured)?;
    mac.update(&canonical);
    let digest = mac.finalize().into_bytes();
    Ok(crate::core::hashing::HashDigest::from_bytes(&digest).as_str().to_string())
}

/// Verifies a hex signature in constant time.
fn verify_payload(payload: &WireToken, secret: &[u8], sig_hex: &str) -> Result<(), BreakGlassError> {
    let canonical =
        serde_jcs::to_vec(payload).map_err(|_| BreakGlassError::Malformed)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|_| BreakGlassError::NotConfigured)?;
    mac.update(&canonical);
    let sig_bytes =
        crate::core::hashing::hex_decode(sig_hex).ok_or(BreakGlassError::InvalidSignature)?;
    mac.verify_slice(&sig_bytes).map_err(|_| BreakGlassError::InvalidSignature)
}

// ============================================================================
// SECTION: Issuance
// ============================================================================

/// Issues a signed, time-bound break-glass token.
///
/// # Errors
///
/// Returns [`BreakGlassError::InvalidJustification`] for short
/// justifications and [`BreakGlassError::NotConfigured`] for an empty secret.
pub fn issue_break_glass_token(
    secret: &[u8],
    actor_id: &ActorId,
    tenant_id: &TenantId,
    deal_id: Option<&DealId>,
    justification: &str,
    duration_seconds: i64,
    now: Timestamp,
) -> Result<String, BreakGlassError> {
    if secret.is_empty() {
        return Err(BreakGlassError::NotConfigured);
    }
    let trimmed = justification.trim();
    if trimmed.chars().count() < MIN_JUSTIFICATION_LENGTH {
        return Err(BreakGlassError::InvalidJustification);
    }
    let duration = duration_seconds.clamp(MIN_DURATION_SECONDS, MAX_DURATION_SECONDS);

    let issued = now.unix_seconds();
    let mut payload = WireToken {
        token_id: crate::core::identifiers::new_uuid(),
        actor_id: actor_id.as_str().to_string(),
        tenant_id: tenant_id.as_str().to_string(),
        deal_id: deal_id.map(|id| id.as_str().to_string()),
        justification: trimmed.to_string(),
        iat: issued,
        exp: issued + duration,
        sig: None,
    };
    let signature = sign_payload(&payload, secret)?;
    payload.sig = Some(signature);

    let token_json =
        serde_json::to_vec(&payload).map_err(|_| BreakGlassError::Malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(token_json))
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a break-glass token against the expected bindings.
///
/// # Errors
///
/// Returns the specific [`BreakGlassError`] for each failed check: decode,
/// signature, expiry (strict), tenant, deal, actor, and justification.
pub fn validate_break_glass_token(
    raw_token: &str,
    secret: &[u8],
    expected_tenant: &TenantId,
    expected_deal: Option<&DealId>,
    expected_actor: &ActorId,
    now: Timestamp,
) -> Result<BreakGlassToken, BreakGlassError> {
    if secret.is_empty() {
        return Err(BreakGlassError::NotConfigured);
    }

    let decoded = decode_token_bytes(raw_token)?;
    let mut wire: WireToken =
        serde_json::from_slice(&decoded).map_err(|_| BreakGlassError::Malformed)?;
    let provided_sig = wire.sig.take().ok_or(BreakGlassError::Malformed)?;
    verify_payload(&wire, secret, &provided_sig)?;

    if now.unix_seconds() > wire.exp {
        return Err(BreakGlassError::Expired);
    }
    if !wire.tenant_id.eq_ignore_ascii_case(expected_tenant.as_str()) {
        return Err(BreakGlassError::TenantMismatch);
    }
    if let (Some(expected), Some(bound)) = (expected_deal, &wire.deal_id)
        && !bound.eq_ignore_ascii_case(expected.as_str())
    {
        return Err(BreakGlassError::DealMismatch);
    }
    if !wire.actor_id.eq_ignore_ascii_case(expected_actor.as_str()) {
        return Err(BreakGlassError::ActorMismatch);
    }
    if wire.justification.trim().chars().count() < MIN_JUSTIFICATION_LENGTH {
        return Err(BreakGlassError::InvalidJustification);
    }

    Ok(BreakGlassToken {
        token_id: wire.token_id,
        actor_id: ActorId::new(wire.actor_id),
        tenant_id: TenantId::new(wire.tenant_id),
        deal_id: wire.deal_id.map(DealId::new),
        justification: wire.justification,
        iat: wire.iat,
        exp: wire.exp,
    })
}

/// Decodes the URL-safe Base64 token body, tolerating padded input.
fn decode_token_bytes(raw_token: &str) -> Result<Vec<u8>, BreakGlassError> {
    let trimmed = raw_token.trim_end_matches('=');
    URL_SAFE_NO_PAD.decode(trimmed).map_err(|_| BreakGlassError::Malformed)
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Emits the mandatory CRITICAL `break_glass.used` audit event.
///
/// The payload carries only the SHA-256 of the raw token and of the
/// justification plus its length; never the raw values. Break-glass access
/// is denied when this emission fails.
///
/// # Errors
///
/// Returns [`BreakGlassError::AuditEmitFailed`] when validation or emission
/// fails (fail-closed).
#[allow(clippy::too_many_arguments, reason = "Event construction needs the full request context.")]
pub fn emit_break_glass_audit(
    sink: &dyn AuditSink,
    token: &BreakGlassToken,
    raw_token: &str,
    request_id: &RequestId,
    method: HttpMethod,
    path: &str,
    resource: AuditResource,
    operation_id: &str,
    now: Timestamp,
) -> Result<(), BreakGlassError> {
    let mut safe = BTreeMap::new();
    safe.insert(
        "scope".to_string(),
        serde_json::Value::String(
            token.deal_id.as_ref().map_or_else(|| "tenant-wide".to_string(), ToString::to_string),
        ),
    );
    safe.insert(
        "expires_at".to_string(),
        serde_json::Value::String(
            Timestamp::from_unix_seconds(token.exp).map_or_else(String::new, |ts| ts.to_string()),
        ),
    );
    safe.insert(
        "justification_len".to_string(),
        serde_json::Value::from(token.justification.chars().count()),
    );

    let mut refs = vec![format!("operation:{operation_id}")];
    if let Some(deal_id) = &token.deal_id {
        refs.push(format!("deal_id:{deal_id}"));
    }

    let event = AuditEvent {
        event_id: EventId::mint(),
        occurred_at: now,
        tenant_id: token.tenant_id.clone(),
        actor: AuditActor {
            actor_type: ActorType::Human,
            actor_id: token.actor_id.clone(),
            roles: vec![Role::Admin.as_str().to_string()],
            ip: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        },
        request: AuditRequest {
            request_id: request_id.clone(),
            method,
            path: path.to_string(),
            status_code: 200,
            idempotency_key: None,
        },
        resource,
        event_type: "break_glass.used".to_string(),
        severity: AuditSeverity::Critical,
        summary: format!("Break-glass access via {operation_id}"),
        payload: AuditPayload {
            hashes: vec![
                format!("token_sha256:{}", sha256_hex(raw_token)),
                format!("justification_sha256:{}", sha256_hex(&token.justification)),
            ],
            refs,
            safe,
        },
    };

    let validation = validate_audit_event(&event);
    if !validation.passed {
        return Err(BreakGlassError::AuditEmitFailed);
    }
    sink.emit(&event).map_err(|_| BreakGlassError::AuditEmitFailed)
}
