// idis-core/src/core/identifiers.rs
// ============================================================================
// Module: IDIS Identifiers
// Description: Canonical opaque identifiers for IDIS entities.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! IDIS. Identifiers are opaque and serialize as strings. UUID-valued
//! identifiers are normalised to lowercase on construction so that hashing
//! and cross-store comparisons never depend on caller casing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: UUID Minting
// ============================================================================

/// Mints a new random UUID rendered lowercase.
#[must_use]
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a lowercase-normalised string identifier newtype.
macro_rules! declare_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, lowercasing the value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into().to_ascii_lowercase())
            }

            /// Mints a fresh random identifier.
            #[must_use]
            pub fn mint() -> Self {
                Self(new_uuid())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

declare_id! {
    /// Tenant identifier scoping every persistent IDIS entity.
    TenantId
}

declare_id! {
    /// Deal identifier for an investment opportunity.
    DealId
}

declare_id! {
    /// Document identifier for an ingested artifact.
    DocumentId
}

declare_id! {
    /// Span identifier for the minimal addressable content locator.
    SpanId
}

declare_id! {
    /// Claim identifier for an extracted proposition.
    ClaimId
}

declare_id! {
    /// Evidence item identifier.
    EvidenceId
}

declare_id! {
    /// Sanad identifier for an evidence chain.
    SanadId
}

declare_id! {
    /// Transmission node identifier within a Sanad chain.
    NodeId
}

declare_id! {
    /// Defect identifier.
    DefectId
}

declare_id! {
    /// Deterministic calculation identifier.
    CalcId
}

declare_id! {
    /// Run identifier for an orchestrated pipeline execution.
    RunId
}

declare_id! {
    /// Run step identifier within the step ledger.
    StepId
}

declare_id! {
    /// Deliverable identifier.
    DeliverableId
}

declare_id! {
    /// Actor identifier from the authenticated tenant context.
    ActorId
}

declare_id! {
    /// Request correlation identifier echoed on every response.
    RequestId
}

declare_id! {
    /// Audit event identifier.
    EventId
}

declare_id! {
    /// Legal hold identifier.
    HoldId
}
