// idis-core/src/validators/no_free_facts.rs
// ============================================================================
// Module: IDIS No-Free-Facts Validator
// Description: Requires a claim or calc reference behind every factual fact.
// Purpose: Enforce the traceability rule before any deliverable ships.
// Dependencies: crate::deliverables::model
// ============================================================================

//! ## Overview
//! Every factual sentence in a deliverable must be traceable to a registered
//! claim or calculation. The gate is hard: `is_subjective` does not bypass
//! it; to exempt a fact, set `is_factual` to false. Section-level
//! subjectivity never overrides the per-fact flag. Violations aggregate into
//! one failing result listing every offending path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::deliverables::model::Deliverable;
use crate::validators::ValidationIssue;
use crate::validators::ValidationResult;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validates the No-Free-Facts rule over a deliverable.
#[must_use]
pub fn validate_no_free_facts(deliverable: &Deliverable) -> ValidationResult {
    let mut errors = Vec::new();

    for (section_index, section) in deliverable.sections.iter().enumerate() {
        for (fact_index, fact) in section.facts.iter().enumerate() {
            if !fact.is_factual {
                continue;
            }
            if fact.claim_refs.is_empty() && fact.calc_refs.is_empty() {
                errors.push(ValidationIssue::new(
                    "NO_FREE_FACTS_VIOLATION",
                    format!(
                        "factual statement '{}' carries no claim or calc reference",
                        truncate(&fact.text)
                    ),
                    format!("$.sections[{section_index}].facts[{fact_index}]"),
                ));
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::success()
    } else {
        ValidationResult::fail(errors)
    }
}

/// Truncates fact text for finding messages.
fn truncate(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
