// idis-core/src/security/abac.rs
// ============================================================================
// Module: IDIS Deal-Level ABAC
// Description: Assignment-based access control for deal-scoped operations.
// Purpose: Deny-by-default deal access with break-glass escalation for admins.
// Dependencies: crate::{core, interfaces, security::context}
// ============================================================================

//! ## Overview
//! Deal-scoped operations require the actor to be directly assigned to the
//! deal or in a group assigned to it. Auditors are denied mutations
//! regardless of assignment. Unassigned admins are denied with a
//! break-glass hint. Unknown and cross-tenant deals produce the same wire
//! shape as unauthorized access, so no existence oracle exists. Claim-scoped
//! operations resolve the claim to its deal under tenant scope first; a
//! configured-but-unavailable resolver denies fail-closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::TenantId;
use crate::interfaces::ClaimDealResolver;
use crate::interfaces::DealAssignmentStore;
use crate::interfaces::ResolutionError;
use crate::security::context::Role;
use crate::security::context::TenantContext;

// ============================================================================
// SECTION: Decision Codes
// ============================================================================

/// ABAC decision codes for audit and error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbacDecisionCode {
    /// Access granted.
    #[serde(rename = "ABAC_ALLOWED")]
    Allowed,
    /// Actor holds no assignment for the deal.
    #[serde(rename = "ABAC_DENIED_NO_ASSIGNMENT")]
    DeniedNoAssignment,
    /// Auditor attempted a mutation.
    #[serde(rename = "ABAC_DENIED_AUDITOR_MUTATION")]
    DeniedAuditorMutation,
    /// Unassigned admin must use break-glass.
    #[serde(rename = "ABAC_DENIED_BREAK_GLASS_REQUIRED")]
    DeniedBreakGlassRequired,
    /// Deal unknown or out of the caller's scope.
    #[serde(rename = "ABAC_DENIED_UNKNOWN_OR_OUT_OF_SCOPE")]
    DeniedUnknownOrOutOfScope,
    /// Resolution infrastructure unavailable.
    #[serde(rename = "ABAC_RESOLUTION_FAILED")]
    ResolutionFailed,
}

/// Result of ABAC evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbacDecision {
    /// True when access is allowed.
    pub allow: bool,
    /// Machine-readable decision code.
    pub code: AbacDecisionCode,
    /// Short, generic message.
    pub message: String,
    /// True when the denial can be lifted by a valid break-glass token.
    #[serde(default)]
    pub requires_break_glass: bool,
}

impl AbacDecision {
    /// Builds an allow decision.
    fn allowed(message: &str) -> Self {
        Self {
            allow: true,
            code: AbacDecisionCode::Allowed,
            message: message.to_string(),
            requires_break_glass: false,
        }
    }

    /// Builds a deny decision.
    fn denied(code: AbacDecisionCode, message: &str) -> Self {
        Self {
            allow: false,
            code,
            message: message.to_string(),
            requires_break_glass: false,
        }
    }
}

// ============================================================================
// SECTION: Deal Access
// ============================================================================

/// Checks ABAC access for a deal-scoped operation.
#[must_use]
pub fn check_deal_access(
    tenant: &TenantContext,
    deal_id: &DealId,
    is_mutation: bool,
    store: &dyn DealAssignmentStore,
) -> AbacDecision {
    if tenant.tenant_id.as_str().is_empty()
        || tenant.actor_id.as_str().is_empty()
        || deal_id.as_str().is_empty()
    {
        return AbacDecision::denied(AbacDecisionCode::DeniedUnknownOrOutOfScope, "Access denied");
    }

    if tenant.is_auditor_only() && is_mutation {
        return AbacDecision::denied(
            AbacDecisionCode::DeniedAuditorMutation,
            "Auditor role cannot perform mutations",
        );
    }

    let assigned = store.is_actor_assigned(&tenant.tenant_id, deal_id, &tenant.actor_id);
    let in_group = store.is_actor_in_deal_group(&tenant.tenant_id, deal_id, &tenant.actor_id);
    if assigned || in_group {
        return AbacDecision::allowed("Access granted via assignment");
    }

    if tenant.has_role(Role::Admin) {
        return AbacDecision {
            allow: false,
            code: AbacDecisionCode::DeniedBreakGlassRequired,
            message: "Admin access to unassigned deal requires break-glass".to_string(),
            requires_break_glass: true,
        };
    }

    AbacDecision::denied(AbacDecisionCode::DeniedNoAssignment, "Access denied")
}

/// Checks ABAC access with a break-glass override already validated.
#[must_use]
pub fn check_deal_access_with_break_glass(
    tenant: &TenantContext,
    deal_id: &DealId,
    is_mutation: bool,
    break_glass_valid: bool,
    store: &dyn DealAssignmentStore,
) -> AbacDecision {
    let decision = check_deal_access(tenant, deal_id, is_mutation, store);
    if decision.requires_break_glass && break_glass_valid {
        return AbacDecision::allowed("Access granted via break-glass override");
    }
    decision
}

// ============================================================================
// SECTION: Claim Resolution
// ============================================================================

/// Resolves a claim to its parent deal for claim-scoped ABAC.
///
/// Unknown and cross-tenant claims resolve to `None` and are treated by
/// callers exactly like unknown deals.
///
/// # Errors
///
/// Returns [`ResolutionError::Unavailable`] when the resolver backend is
/// configured but unreachable; callers deny with `ABAC_RESOLUTION_FAILED`.
pub fn resolve_deal_for_claim(
    tenant_id: &TenantId,
    claim_id: &ClaimId,
    resolver: &dyn ClaimDealResolver,
) -> Result<Option<DealId>, ResolutionError> {
    if tenant_id.as_str().is_empty() || claim_id.as_str().is_empty() {
        return Ok(None);
    }
    resolver.resolve_deal_id_for_claim(tenant_id, claim_id)
}

// ============================================================================
// SECTION: In-Memory Stores
// ============================================================================

/// In-memory deal assignment store for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryDealAssignmentStore {
    /// Direct assignments keyed by `(tenant, deal, actor)`.
    assignments: Mutex<BTreeMap<(TenantId, DealId, ActorId), ()>>,
    /// Group memberships keyed by `(tenant, deal, actor)`.
    groups: Mutex<BTreeMap<(TenantId, DealId, ActorId), ()>>,
}

impl InMemoryDealAssignmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a direct assignment.
    pub fn add_assignment(&self, tenant_id: &TenantId, deal_id: &DealId, actor_id: &ActorId) {
        if let Ok(mut guard) = self.assignments.lock() {
            guard.insert((tenant_id.clone(), deal_id.clone(), actor_id.clone()), ());
        }
    }

    /// Adds a group membership.
    pub fn add_group_membership(&self, tenant_id: &TenantId, deal_id: &DealId, actor_id: &ActorId) {
        if let Ok(mut guard) = self.groups.lock() {
            guard.insert((tenant_id.clone(), deal_id.clone(), actor_id.clone()), ());
        }
    }

    /// Removes a direct assignment.
    pub fn remove_assignment(&self, tenant_id: &TenantId, deal_id: &DealId, actor_id: &ActorId) {
        if let Ok(mut guard) = self.assignments.lock() {
            guard.remove(&(tenant_id.clone(), deal_id.clone(), actor_id.clone()));
        }
    }
}

impl DealAssignmentStore for InMemoryDealAssignmentStore {
    fn is_actor_assigned(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        actor_id: &ActorId,
    ) -> bool {
        self.assignments
            .lock()
            .map(|guard| {
                guard.contains_key(&(tenant_id.clone(), deal_id.clone(), actor_id.clone()))
            })
            .unwrap_or(false)
    }

    fn is_actor_in_deal_group(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        actor_id: &ActorId,
    ) -> bool {
        self.groups
            .lock()
            .map(|guard| {
                guard.contains_key(&(tenant_id.clone(), deal_id.clone(), actor_id.clone()))
            })
            .unwrap_or(false)
    }
}

/// In-memory claim-to-deal resolver for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryClaimDealResolver {
    /// Mappings keyed by `(tenant, claim)`.
    claims: Mutex<BTreeMap<(TenantId, ClaimId), DealId>>,
    /// Simulates a configured-but-unreachable backend when set.
    unavailable: Mutex<bool>,
}

impl InMemoryClaimDealResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a claim's parent deal.
    pub fn add_claim(&self, tenant_id: &TenantId, claim_id: &ClaimId, deal_id: &DealId) {
        if let Ok(mut guard) = self.claims.lock() {
            guard.insert((tenant_id.clone(), claim_id.clone()), deal_id.clone());
        }
    }

    /// Marks the backend unavailable to exercise fail-closed behavior.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut guard) = self.unavailable.lock() {
            *guard = unavailable;
        }
    }
}

impl ClaimDealResolver for InMemoryClaimDealResolver {
    fn resolve_deal_id_for_claim(
        &self,
        tenant_id: &TenantId,
        claim_id: &ClaimId,
    ) -> Result<Option<DealId>, ResolutionError> {
        if self.unavailable.lock().map(|guard| *guard).unwrap_or(true) {
            return Err(ResolutionError::Unavailable);
        }
        Ok(self
            .claims
            .lock()
            .ok()
            .and_then(|guard| guard.get(&(tenant_id.clone(), claim_id.clone())).cloned()))
    }
}
