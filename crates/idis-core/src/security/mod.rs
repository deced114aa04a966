// idis-core/src/security/mod.rs
// ============================================================================
// Module: IDIS Security Perimeter
// Description: Tenant isolation gates evaluated at every mutation.
// Purpose: Residency, RBAC, ABAC, break-glass, BYOK, and legal hold.
// Dependencies: crate::{core, interfaces, audit, validators}
// ============================================================================

//! ## Overview
//! Five overlapping gates protect every /v1 mutation: authentication produces
//! a tenant context, residency pins the tenant to the service region, RBAC
//! applies the role matrix, ABAC applies deal-level assignment, and the
//! compliance gates (BYOK, legal hold) guard protected data classes and
//! deletion paths. Every gate fails closed and every override is audited.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod abac;
pub mod break_glass;
pub mod byok;
pub mod context;
pub mod legal_hold;
pub mod rbac;
pub mod residency;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use abac::AbacDecision;
pub use abac::AbacDecisionCode;
pub use abac::InMemoryClaimDealResolver;
pub use abac::InMemoryDealAssignmentStore;
pub use abac::check_deal_access;
pub use abac::check_deal_access_with_break_glass;
pub use abac::resolve_deal_for_claim;
pub use break_glass::BreakGlassError;
pub use break_glass::BreakGlassToken;
pub use break_glass::MIN_JUSTIFICATION_LENGTH;
pub use break_glass::emit_break_glass_audit;
pub use break_glass::issue_break_glass_token;
pub use break_glass::validate_break_glass_token;
pub use byok::ByokError;
pub use byok::ByokKeyState;
pub use byok::ByokRegistry;
pub use byok::DataClass;
pub use context::Role;
pub use context::TenantContext;
pub use legal_hold::HoldError;
pub use legal_hold::HoldTarget;
pub use legal_hold::LegalHold;
pub use legal_hold::LegalHoldRegistry;
pub use legal_hold::RetentionClass;
pub use legal_hold::RetentionDecision;
pub use legal_hold::evaluate_retention;
pub use rbac::RbacError;
pub use rbac::check_role_access;
pub use residency::ResidencyError;
pub use residency::enforce_residency;
