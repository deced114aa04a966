// idis-core/src/runtime/extraction.rs
// ============================================================================
// Module: IDIS Extraction Pipeline
// Description: Chunk, extract, dedupe, and persist claims from spans.
// Purpose: Turn ingested document spans into typed, graded-D claims.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The pipeline walks document spans in chunks, applies the injected
//! extractor, dedupes candidates by normalized text and class, and persists
//! the survivors as grade-D claims referencing their primary span. Concrete
//! LLM extractors live outside the core behind the [`ClaimExtractor`] seam;
//! the built-in pattern extractor recognises monetary statements
//! deterministically for snapshot runs and tests. A span that fails
//! extraction degrades the run to PARTIAL rather than aborting it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::claim::Claim;
use crate::core::claim::ClaimAction;
use crate::core::claim::ClaimClass;
use crate::core::claim::ClaimVerdict;
use crate::core::claim::Grade;
use crate::core::claim::Materiality;
use crate::core::decimal::Dec;
use crate::core::document::Document;
use crate::core::document::Span;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::core::value_struct::Currency;
use crate::core::value_struct::ValueStruct;
use crate::interfaces::ClaimRepository;
use crate::interfaces::RepoError;

// ============================================================================
// SECTION: Extractor Seam
// ============================================================================

/// Extraction failures from a concrete extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extractor backend failed or timed out.
    #[error("extractor error: {0}")]
    Backend(String),
}

/// A candidate claim produced by an extractor before dedupe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClaim {
    /// Claim class.
    pub claim_class: ClaimClass,
    /// Extracted claim text.
    pub text: String,
    /// Structured value, when the extractor parsed one.
    pub value: Option<ValueStruct>,
    /// Extractor confidence in `[0, 1]`.
    pub extraction_confidence: Dec,
    /// Materiality estimate.
    pub materiality: Materiality,
}

/// Backend-agnostic claim extractor.
pub trait ClaimExtractor: Send + Sync {
    /// Extracts candidate claims from one span.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the backend fails; the pipeline records
    /// the span as failed and continues.
    fn extract(&self, span: &Span) -> Result<Vec<ExtractedClaim>, ExtractError>;
}

// ============================================================================
// SECTION: Pattern Extractor
// ============================================================================

/// Deterministic extractor recognising monetary statements.
///
/// Scans for currency-prefixed amounts (`$5M`, `$1,200,000`) and emits one
/// FINANCIAL claim per span containing at least one. Confidence is fixed:
/// the pattern either matches or it does not.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternClaimExtractor;

impl PatternClaimExtractor {
    /// Creates the extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scans text for the first currency-prefixed amount.
    fn find_amount(text: &str) -> Option<Dec> {
        let bytes = text.as_bytes();
        let start = text.find('$')?;
        let mut digits = String::new();
        let mut index = start + 1;
        while index < bytes.len() {
            let ch = bytes[index] as char;
            if ch.is_ascii_digit() || ch == '.' {
                digits.push(ch);
            } else if ch != ',' {
                break;
            }
            index += 1;
        }
        if digits.is_empty() {
            return None;
        }
        let multiplier = match bytes.get(index).map(|byte| (*byte as char).to_ascii_uppercase()) {
            Some('K') => 1_000_i64,
            Some('M') => 1_000_000_i64,
            Some('B') => 1_000_000_000_i64,
            _ => 1_i64,
        };
        Dec::parse(&digits).ok().map(|value| &value * &Dec::from_i64(multiplier))
    }
}

impl ClaimExtractor for PatternClaimExtractor {
    fn extract(&self, span: &Span) -> Result<Vec<ExtractedClaim>, ExtractError> {
        let Some(amount) = Self::find_amount(&span.text_excerpt) else {
            return Ok(Vec::new());
        };
        Ok(vec![ExtractedClaim {
            claim_class: ClaimClass::Financial,
            text: span.text_excerpt.trim().to_string(),
            value: Some(ValueStruct::Monetary {
                amount,
                currency: Currency::USD,
                as_of: None,
                time_window: None,
            }),
            extraction_confidence: Dec::parse("0.97").unwrap_or_else(|_| Dec::zero()),
            materiality: Materiality::Medium,
        }])
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Terminal status of an extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    /// Every span extracted cleanly.
    Completed,
    /// Some spans failed; surviving claims were persisted.
    Partial,
}

/// Summary returned by the pipeline and recorded in the step ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Terminal status.
    pub status: ExtractionStatus,
    /// Persisted claim ids in creation order.
    pub created_claim_ids: Vec<ClaimId>,
    /// Number of span chunks processed.
    pub chunk_count: u32,
    /// Unique claims after dedupe.
    pub unique_claim_count: u32,
    /// Candidates dropped as duplicates.
    pub conflict_count: u32,
    /// Spans whose extraction failed.
    pub failed_span_count: u32,
}

/// Pipeline failures.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Claim persistence failed.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Chunk → extract → dedupe → persist pipeline.
pub struct ExtractionPipeline {
    /// Injected extractor.
    extractor: Arc<dyn ClaimExtractor>,
    /// Claim persistence.
    claims: Arc<dyn ClaimRepository>,
}

impl ExtractionPipeline {
    /// Creates a pipeline over an extractor and claim repository.
    #[must_use]
    pub fn new(extractor: Arc<dyn ClaimExtractor>, claims: Arc<dyn ClaimRepository>) -> Self {
        Self { extractor, claims }
    }

    /// Runs extraction over the documents of a deal.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] only on persistence failure; extractor
    /// failures degrade the summary to PARTIAL instead.
    pub fn run(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        documents: &[Document],
        now: Timestamp,
    ) -> Result<ExtractionSummary, ExtractionError> {
        let mut seen: BTreeSet<(ClaimClass, String)> = BTreeSet::new();
        let mut created_claim_ids = Vec::new();
        let mut chunk_count: u32 = 0;
        let mut conflict_count: u32 = 0;
        let mut failed_span_count: u32 = 0;

        for document in documents {
            for span in &document.spans {
                chunk_count += 1;
                let candidates = match self.extractor.extract(span) {
                    Ok(candidates) => candidates,
                    Err(error) => {
                        tracing::warn!(span = %span.span_id, error = %error, "span extraction failed");
                        failed_span_count += 1;
                        continue;
                    }
                };
                for candidate in candidates {
                    let key = (candidate.claim_class, normalize(&candidate.text));
                    if !seen.insert(key) {
                        conflict_count += 1;
                        continue;
                    }
                    let claim = build_claim(tenant_id, deal_id, span, candidate, now);
                    self.claims.create(&claim)?;
                    created_claim_ids.push(claim.claim_id);
                }
            }
        }

        let status = if failed_span_count == 0 {
            ExtractionStatus::Completed
        } else {
            ExtractionStatus::Partial
        };
        let unique_claim_count = u32::try_from(created_claim_ids.len()).unwrap_or(u32::MAX);

        Ok(ExtractionSummary {
            status,
            created_claim_ids,
            chunk_count,
            unique_claim_count,
            conflict_count,
            failed_span_count,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes claim text for dedupe comparison.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Builds a persisted claim from an extraction candidate.
fn build_claim(
    tenant_id: &TenantId,
    deal_id: &DealId,
    span: &Span,
    candidate: ExtractedClaim,
    now: Timestamp,
) -> Claim {
    Claim {
        claim_id: ClaimId::mint(),
        tenant_id: tenant_id.clone(),
        deal_id: deal_id.clone(),
        claim_class: candidate.claim_class,
        text: candidate.text,
        value: candidate.value,
        claim_grade: Grade::D,
        claim_verdict: ClaimVerdict::Unverified,
        claim_action: ClaimAction::Verify,
        materiality: candidate.materiality,
        primary_span_id: span.span_id.clone(),
        cited_document: None,
        extraction_confidence: Some(candidate.extraction_confidence),
        dhabt_score: None,
        is_factual: true,
        is_subjective: false,
        evidence_ids: Vec::new(),
        calc_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
