// idis-core/src/security/rbac.rs
// ============================================================================
// Module: IDIS Role Matrix
// Description: Role-to-operation access checks.
// Purpose: Deny mutations to read-only roles before ABAC runs.
// Dependencies: crate::core::envelope, crate::security::context
// ============================================================================

//! ## Overview
//! The role matrix runs after residency and before deal-level ABAC. Auditors
//! may read anything inside their tenant but mutate nothing; every other
//! role may attempt mutations subject to the later ABAC gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::envelope::codes;
use crate::security::context::TenantContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Role-matrix denial.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Access denied")]
pub struct RbacError;

impl RbacError {
    /// Returns the stable envelope code for this denial.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        codes::RBAC_DENIED
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Checks the role matrix for an operation.
///
/// # Errors
///
/// Returns [`RbacError`] when a read-only role attempts a mutation or the
/// caller holds no roles at all.
pub fn check_role_access(tenant: &TenantContext, is_mutation: bool) -> Result<(), RbacError> {
    if tenant.roles.is_empty() {
        return Err(RbacError);
    }
    if is_mutation && tenant.is_auditor_only() {
        return Err(RbacError);
    }
    Ok(())
}
