// idis-core/src/validators/mod.rs
// ============================================================================
// Module: IDIS Validators
// Description: Fail-closed validation for events, gates, and deliverables.
// Purpose: Provide result-typed validators shared by engines and pipelines.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Validators return [`ValidationResult`] values rather than raising across
//! layers; callers convert failures to typed errors at their own boundary.
//! Every validator fails closed: missing or malformed input is a failure,
//! never a pass.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit_event;
pub mod extraction_gate;
pub mod muhasabah;
pub mod no_free_facts;
pub mod pagination;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit_event::REDACTION_BLOCKLIST;
pub use audit_event::validate_audit_event;
pub use extraction_gate::ExtractionGateBlockedError;
pub use extraction_gate::ExtractionGateDecision;
pub use extraction_gate::ExtractionGateInput;
pub use extraction_gate::enforce_extraction_gate;
pub use extraction_gate::evaluate_extraction_gate;
pub use muhasabah::GateRejectionReason;
pub use muhasabah::validate_muhasabah;
pub use no_free_facts::validate_no_free_facts;
pub use pagination::PageError;
pub use pagination::PageRequest;
pub use pagination::ValidatedPage;
pub use pagination::validate_page_request;

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable finding code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// JSONPath-style location of the finding.
    pub path: String,
}

impl ValidationIssue {
    /// Builds a finding.
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            path: path.into(),
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no errors were found.
    pub passed: bool,
    /// Blocking findings.
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Builds a passing result.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Builds a passing result carrying warnings.
    #[must_use]
    pub const fn success_with_warnings(warnings: Vec<ValidationIssue>) -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
            warnings,
        }
    }

    /// Builds a failing result.
    #[must_use]
    pub const fn fail(errors: Vec<ValidationIssue>) -> Self {
        Self {
            passed: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Builds a failing result from a single fail-closed condition.
    #[must_use]
    pub fn fail_closed(message: &str) -> Self {
        Self::fail(vec![ValidationIssue::new("FAIL_CLOSED", message, "$")])
    }

    /// Returns the error codes, for assertions and envelope details.
    #[must_use]
    pub fn error_codes(&self) -> Vec<String> {
        self.errors.iter().map(|issue| issue.code.clone()).collect()
    }
}
