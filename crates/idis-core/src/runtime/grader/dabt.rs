// idis-core/src/runtime/grader/dabt.rs
// ============================================================================
// Module: IDIS Dabt Scoring
// Description: Precision quality of a source across four dimensions.
// Purpose: Derive a weighted precision score that can cap the grade at B.
// Dependencies: crate::core::{claim, decimal, sanad}
// ============================================================================

//! ## Overview
//! Dabt measures the precision of an evidence chain across four independent
//! dimensions: timestamp coverage, figure precision, identifier coverage,
//! and methodology disclosure. The weighted score lands in `[0, 1]`; a score
//! below 0.50 caps the final grade at B. All arithmetic is Decimal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Claim;
use crate::core::decimal::Dec;
use crate::core::sanad::Sanad;
use crate::runtime::grader::tiers::SourceTier;

// ============================================================================
// SECTION: Score Model
// ============================================================================

/// Dimension scores feeding the weighted Dabt score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DabtDimensions {
    /// Fraction of chain nodes carrying a parseable timestamp.
    pub timestamp_precision: Dec,
    /// Figure precision, from the claim's dhabt score when present.
    pub figure_precision: Dec,
    /// Fraction of chain nodes carrying an upstream origin identifier.
    pub identifier_precision: Dec,
    /// Methodology disclosure, derived from the primary tier.
    pub methodology_disclosure: Dec,
}

/// Weighted Dabt score with its quality band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DabtScore {
    /// Weighted score in `[0, 1]`.
    pub score: Dec,
    /// Quality band label.
    pub quality_band: String,
    /// Component dimensions.
    pub dimensions: DabtDimensions,
}

/// Grade cap threshold: below this score, the grade caps at B.
#[must_use]
pub fn cap_threshold() -> Dec {
    Dec::parse("0.50").unwrap_or_else(|_| Dec::zero())
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Fraction helper over a node predicate.
fn fraction(total: usize, matching: usize) -> Dec {
    if total == 0 {
        return Dec::zero();
    }
    let total_i64 = i64::try_from(total).unwrap_or(i64::MAX);
    let matching_i64 = i64::try_from(matching).unwrap_or(i64::MAX);
    Dec::from_i64(matching_i64)
        .checked_div(&Dec::from_i64(total_i64))
        .unwrap_or_else(Dec::zero)
}

/// Derives the Dabt dimensions from a sanad, claim, and primary tier.
#[must_use]
pub fn extract_dabt_dimensions(
    sanad: &Sanad,
    claim: Option<&Claim>,
    primary_tier: SourceTier,
) -> DabtDimensions {
    let total = sanad.transmission_chain.len();
    let with_timestamp =
        sanad.transmission_chain.iter().filter(|node| node.timestamp.is_some()).count();
    let with_origin = sanad
        .transmission_chain
        .iter()
        .filter(|node| node.upstream_origin_id.is_some())
        .count();

    let figure_precision = claim
        .and_then(|claim| claim.dhabt_score.clone())
        .unwrap_or_else(Dec::zero);

    let methodology_disclosure = match primary_tier {
        SourceTier::T1 | SourceTier::T2 => Dec::parse("1.0"),
        SourceTier::T3 => Dec::parse("0.7"),
        SourceTier::T4 => Dec::parse("0.4"),
        SourceTier::T5 => Dec::parse("0.0"),
    }
    .unwrap_or_else(|_| Dec::zero());

    DabtDimensions {
        timestamp_precision: fraction(total, with_timestamp),
        figure_precision,
        identifier_precision: fraction(total, with_origin),
        methodology_disclosure,
    }
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Computes the weighted Dabt score.
///
/// Weights: figures 0.35, timestamps 0.25, identifiers 0.20, methodology
/// 0.20.
#[must_use]
pub fn calculate_dabt_score(dimensions: DabtDimensions) -> DabtScore {
    let parse = |literal: &str| Dec::parse(literal).unwrap_or_else(|_| Dec::zero());
    let score = &(&(&dimensions.figure_precision * &parse("0.35"))
        + &(&dimensions.timestamp_precision * &parse("0.25")))
        + &(&(&dimensions.identifier_precision * &parse("0.20"))
            + &(&dimensions.methodology_disclosure * &parse("0.20")));

    let quality_band = if score >= parse("0.85") {
        "EXCELLENT"
    } else if score >= parse("0.70") {
        "GOOD"
    } else if score >= cap_threshold() {
        "ADEQUATE"
    } else {
        "POOR"
    };

    DabtScore {
        score: score.quantize(4),
        quality_band: quality_band.to_string(),
        dimensions,
    }
}
