// idis-core/src/security/context.rs
// ============================================================================
// Module: IDIS Tenant Context
// Description: Authenticated caller context and the closed role set.
// Purpose: Carry tenant, actor, region, and roles through every gate.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Authentication produces a [`TenantContext`] from the API-key registry.
//! Roles are a closed set; there is no "unknown role" default that could
//! defeat fail-closed checks downstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Closed set of tenant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Tenant administrator.
    Admin,
    /// Diligence analyst.
    Analyst,
    /// Investment partner.
    Partner,
    /// Read-only auditor.
    Auditor,
    /// Machine integration principal.
    IntegrationService,
}

impl Role {
    /// Returns the stable wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Analyst => "ANALYST",
            Self::Partner => "PARTNER",
            Self::Auditor => "AUDITOR",
            Self::IntegrationService => "INTEGRATION_SERVICE",
        }
    }
}

// ============================================================================
// SECTION: Tenant Context
// ============================================================================

/// Authenticated caller context attached to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Actor identifier.
    pub actor_id: ActorId,
    /// Display name of the key or user.
    pub name: String,
    /// IANA timezone of the tenant.
    pub timezone: String,
    /// Pinned data region of the tenant.
    pub data_region: String,
    /// Roles held by the actor.
    pub roles: Vec<Role>,
}

impl TenantContext {
    /// Returns true when the actor holds the role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true when the actor holds only the auditor role.
    #[must_use]
    pub fn is_auditor_only(&self) -> bool {
        self.roles == [Role::Auditor]
    }
}
