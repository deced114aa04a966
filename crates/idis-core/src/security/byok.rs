// idis-core/src/security/byok.rs
// ============================================================================
// Module: IDIS BYOK Registry
// Description: Tenant-supplied key lifecycle and data-class gating.
// Purpose: Lock Class2/Class3 data behind an active tenant key.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Tenants may bring their own KMS key alias. The registry stores only the
//! SHA-256 hash of the alias, never the alias itself. Revoking the key locks
//! every access to Class2 and Class3 data with `BYOK_KEY_REVOKED`; Class0 and
//! Class1 data is exempt. Every key-lifecycle transition emits an audit
//! event, and the operation aborts when that emission fails.

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
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::AuditSink;
use crate::validators::audit_event::validate_audit_event;

// ============================================================================
// SECTION: Key Model
// ============================================================================

/// Lifecycle state of a tenant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ByokKeyState {
    /// Key is active; protected classes are accessible.
    Active,
    /// Key is revoked; protected classes are locked.
    Revoked,
}

/// Data sensitivity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataClass {
    /// Public data.
    Class0,
    /// Internal data.
    Class1,
    /// Confidential data; BYOK-protected.
    Class2,
    /// Restricted data; BYOK-protected.
    Class3,
}

impl DataClass {
    /// Returns true when this class requires an active tenant key.
    #[must_use]
    pub const fn is_byok_protected(self) -> bool {
        matches!(self, Self::Class2 | Self::Class3)
    }
}

/// Stored key metadata; carries only the alias hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByokPolicy {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// SHA-256 of the key alias.
    pub key_alias_hash: String,
    /// Lifecycle state.
    pub state: ByokKeyState,
    /// Configuration timestamp.
    pub configured_at: Timestamp,
    /// Last rotation timestamp, when rotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// BYOK failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ByokError {
    /// Key alias failed validation.
    #[error("invalid key alias")]
    InvalidAlias,
    /// No key configured for the tenant.
    #[error("no key configured for tenant")]
    NotConfigured,
    /// Access to a protected class with a revoked key.
    #[error("Access denied")]
    KeyRevoked,
    /// Mandatory lifecycle audit could not be emitted.
    #[error("byok operation aborted: audit emission failed")]
    AuditEmitFailed,
}

impl ByokError {
    /// Returns the stable envelope code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyRevoked => codes::BYOK_KEY_REVOKED,
            Self::AuditEmitFailed => codes::AUDIT_EMIT_FAILED,
            Self::InvalidAlias | Self::NotConfigured => codes::INVALID_REQUEST,
        }
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// In-process BYOK policy registry.
#[derive(Debug, Default)]
pub struct ByokRegistry {
    /// Policies keyed by tenant.
    policies: Mutex<BTreeMap<TenantId, ByokPolicy>>,
}

impl ByokRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures a tenant key; emits `byok.key.configured`.
    ///
    /// # Errors
    ///
    /// Returns [`ByokError::InvalidAlias`] for empty aliases and
    /// [`ByokError::AuditEmitFailed`] when the lifecycle audit fails.
    pub fn configure_key(
        &self,
        sink: &dyn AuditSink,
        tenant_id: &TenantId,
        actor_id: &ActorId,
        key_alias: &str,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<ByokPolicy, ByokError> {
        validate_alias(key_alias)?;
        let policy = ByokPolicy {
            tenant_id: tenant_id.clone(),
            key_alias_hash: sha256_hex(key_alias),
            state: ByokKeyState::Active,
            configured_at: now,
            rotated_at: None,
        };
        emit_lifecycle_audit(sink, &policy, actor_id, "byok.key.configured", request_id, now)?;
        self.store(policy.clone());
        Ok(policy)
    }

    /// Rotates a tenant key; emits `byok.key.rotated`.
    ///
    /// # Errors
    ///
    /// Returns [`ByokError::NotConfigured`] when no key exists and
    /// [`ByokError::AuditEmitFailed`] when the lifecycle audit fails.
    pub fn rotate_key(
        &self,
        sink: &dyn AuditSink,
        tenant_id: &TenantId,
        actor_id: &ActorId,
        new_key_alias: &str,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<ByokPolicy, ByokError> {
        validate_alias(new_key_alias)?;
        let mut policy = self.get(tenant_id).ok_or(ByokError::NotConfigured)?;
        policy.key_alias_hash = sha256_hex(new_key_alias);
        policy.state = ByokKeyState::Active;
        policy.rotated_at = Some(now);
        emit_lifecycle_audit(sink, &policy, actor_id, "byok.key.rotated", request_id, now)?;
        self.store(policy.clone());
        Ok(policy)
    }

    /// Revokes a tenant key; emits `byok.key.revoked`.
    ///
    /// # Errors
    ///
    /// Returns [`ByokError::NotConfigured`] when no key exists and
    /// [`ByokError::AuditEmitFailed`] when the lifecycle audit fails.
    pub fn revoke_key(
        &self,
        sink: &dyn AuditSink,
        tenant_id: &TenantId,
        actor_id: &ActorId,
        request_id: &RequestId,
        now: Timestamp,
    ) -> Result<ByokPolicy, ByokError> {
        let mut policy = self.get(tenant_id).ok_or(ByokError::NotConfigured)?;
        policy.state = ByokKeyState::Revoked;
        emit_lifecycle_audit(sink, &policy, actor_id, "byok.key.revoked", request_id, now)?;
        self.store(policy.clone());
        Ok(policy)
    }

    /// Gates access to a data class behind the tenant key state.
    ///
    /// Class0/Class1 data is BYOK-exempt. A tenant that never configured a
    /// key is not gated; only a configured-then-revoked key locks the
    /// protected classes.
    ///
    /// # Errors
    ///
    /// Returns [`ByokError::KeyRevoked`] for protected classes under a
    /// revoked key.
    pub fn require_key_active(
        &self,
        tenant_id: &TenantId,
        data_class: DataClass,
    ) -> Result<(), ByokError> {
        if !data_class.is_byok_protected() {
            return Ok(());
        }
        match self.get(tenant_id) {
            Some(policy) if policy.state == ByokKeyState::Revoked => Err(ByokError::KeyRevoked),
            _ => Ok(()),
        }
    }

    /// Returns the stored policy metadata for a tenant.
    #[must_use]
    pub fn get(&self, tenant_id: &TenantId) -> Option<ByokPolicy> {
        self.policies.lock().ok().and_then(|guard| guard.get(tenant_id).cloned())
    }

    /// Stores a policy.
    fn store(&self, policy: ByokPolicy) {
        if let Ok(mut guard) = self.policies.lock() {
            guard.insert(policy.tenant_id.clone(), policy);
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a key alias before hashing.
fn validate_alias(key_alias: &str) -> Result<(), ByokError> {
    let trimmed = key_alias.trim();
    if trimmed.is_empty() || trimmed.len() > 256 {
        return Err(ByokError::InvalidAlias);
    }
    Ok(())
}

/// Emits a key-lifecycle audit event; failure aborts the operation.
fn emit_lifecycle_audit(
    sink: &dyn AuditSink,
    policy: &ByokPolicy,
    actor_id: &ActorId,
    event_type: &str,
    request_id: &RequestId,
    now: Timestamp,
) -> Result<(), ByokError> {
    let mut safe = BTreeMap::new();
    safe.insert(
        "key_state".to_string(),
        serde_json::Value::String(match policy.state {
            ByokKeyState::Active => "ACTIVE".to_string(),
            ByokKeyState::Revoked => "REVOKED".to_string(),
        }),
    );

    let event = AuditEvent {
        event_id: EventId::mint(),
        occurred_at: now,
        tenant_id: policy.tenant_id.clone(),
        actor: AuditActor {
            actor_type: ActorType::Human,
            actor_id: actor_id.clone(),
            roles: vec!["ADMIN".to_string()],
            ip: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        },
        request: AuditRequest {
            request_id: request_id.clone(),
            method: HttpMethod::Post,
            path: "/v1/tenant/byok".to_string(),
            status_code: 200,
            idempotency_key: None,
        },
        resource: AuditResource {
            resource_type: ResourceType::ByokKey,
            resource_id: policy.key_alias_hash.clone(),
        },
        event_type: event_type.to_string(),
        severity: AuditSeverity::High,
        summary: format!("{event_type} for tenant key"),
        payload: AuditPayload {
            hashes: vec![format!("key_alias_sha256:{}", policy.key_alias_hash)],
            refs: Vec::new(),
            safe,
        },
    };

    let validation = validate_audit_event(&event);
    if !validation.passed {
        return Err(ByokError::AuditEmitFailed);
    }
    sink.emit(&event).map_err(|_| ByokError::AuditEmitFailed)
}
