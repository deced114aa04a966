// idis-core/src/core/calc.rs
// ============================================================================
// Module: IDIS Calculation Model
// Description: Deterministic calculations and their provenance records.
// Purpose: Provide the reproducible calc record and its paired CalcSanad.
// Dependencies: serde, crate::core::{claim, decimal, identifiers, time}
// ============================================================================

//! ## Overview
//! A deterministic calculation references input claims, named Decimal inputs,
//! a formula hash, and a code version. Its reproducibility hash covers the
//! canonical JSON of tenant, deal, calc type, formula hash, code version,
//! inputs, and output, so two runs with identical inputs are byte-identical
//! and any divergence is tamper-evident. The paired [`CalcSanad`] derives its
//! grade from the material input grades.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Grade;
use crate::core::decimal::Dec;
use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::core::value_struct::Currency;

// ============================================================================
// SECTION: Calc Types
// ============================================================================

/// Closed set of deterministic calculation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalcType {
    /// Months of runway from cash and burn.
    Runway,
    /// Gross margin from revenue and cost of goods.
    GrossMargin,
    /// Net burn divided by net new ARR.
    BurnMultiple,
    /// Lifetime value over customer acquisition cost.
    LtvCacRatio,
}

impl CalcType {
    /// Returns the stable wire name of the calc type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runway => "RUNWAY",
            Self::GrossMargin => "GROSS_MARGIN",
            Self::BurnMultiple => "BURN_MULTIPLE",
            Self::LtvCacRatio => "LTV_CAC_RATIO",
        }
    }
}

// ============================================================================
// SECTION: Inputs and Output
// ============================================================================

/// Named inputs to a deterministic calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcInputs {
    /// Input claim identifiers, sorted ascending.
    pub claim_ids: Vec<ClaimId>,
    /// Named Decimal input values.
    pub values: BTreeMap<String, Dec>,
    /// Unit/currency/time-window metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Canonical output of a deterministic calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcOutput {
    /// Primary output value, quantized to the formula's output precision.
    pub primary_value: Dec,
    /// Named secondary values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secondary_values: BTreeMap<String, Dec>,
    /// Output unit, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Output currency, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

// ============================================================================
// SECTION: Calculation Record
// ============================================================================

/// A reproducible Decimal-only calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicCalculation {
    /// Calculation identifier.
    pub calc_id: CalcId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent deal.
    pub deal_id: DealId,
    /// Calculation type.
    pub calc_type: CalcType,
    /// Inputs.
    pub inputs: CalcInputs,
    /// Hash of the canonical formula specification.
    pub formula_hash: String,
    /// Deployed code version.
    pub code_version: String,
    /// Output.
    pub output: CalcOutput,
    /// SHA-256 over the canonical JSON of the calculation.
    pub reproducibility_hash: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Calc Sanad
// ============================================================================

/// One step of the calc-grade derivation explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeExplanationEntry {
    /// What this step observed or decided.
    pub step: String,
    /// Grade impact, when the step changed or fixed the grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    /// Input claim the step refers to, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<ClaimId>,
    /// Grade of that input, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_grade: Option<Grade>,
    /// Materiality of that input, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_material: Option<bool>,
}

/// Provenance record pairing a calculation with its input grades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcSanad {
    /// Calc-sanad identifier.
    pub calc_sanad_id: SanadId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The calculation this record explains.
    pub calc_id: CalcId,
    /// Input claim identifiers, sorted ascending.
    pub input_claim_ids: Vec<ClaimId>,
    /// Worst grade across all inputs.
    pub input_min_sanad_grade: Grade,
    /// Derived calc grade (worst material input, fallback to the minimum).
    pub calc_grade: Grade,
    /// Step-by-step derivation explanation.
    pub explanation: Vec<GradeExplanationEntry>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}
