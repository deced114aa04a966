// idis-core/src/security/residency.rs
// ============================================================================
// Module: IDIS Residency Enforcement
// Description: Region pinning between tenant and service deployment.
// Purpose: Refuse to serve a tenant from the wrong region, fail closed.
// Dependencies: crate::core::envelope, crate::security::context
// ============================================================================

//! ## Overview
//! Each tenant is pinned to a data region. The enforcer compares the
//! tenant's region to the configured service region case-insensitively with
//! whitespace trimmed. A mismatch denies with a generic message that names
//! no region; a missing service region denies everything reaching /v1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::envelope::codes;
use crate::security::context::TenantContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Residency denials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResidencyError {
    /// Tenant region does not match the service region.
    #[error("Access denied")]
    RegionMismatch,
    /// Service region is not configured.
    #[error("Access denied")]
    ServiceRegionUnset,
}

impl ResidencyError {
    /// Returns the stable envelope code for this denial.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RegionMismatch => codes::RESIDENCY_REGION_MISMATCH,
            Self::ServiceRegionUnset => codes::RESIDENCY_SERVICE_REGION_UNSET,
        }
    }
}

// ============================================================================
// SECTION: Enforcement
// ============================================================================

/// Enforces tenant-to-service region pinning.
///
/// # Errors
///
/// Returns [`ResidencyError::ServiceRegionUnset`] when no service region is
/// configured, and [`ResidencyError::RegionMismatch`] when the regions
/// disagree after case folding and trimming.
pub fn enforce_residency(
    tenant: &TenantContext,
    service_region: Option<&str>,
) -> Result<(), ResidencyError> {
    let service = service_region
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .ok_or(ResidencyError::ServiceRegionUnset)?;

    let tenant_region = tenant.data_region.trim();
    if tenant_region.eq_ignore_ascii_case(service) {
        Ok(())
    } else {
        Err(ResidencyError::RegionMismatch)
    }
}
