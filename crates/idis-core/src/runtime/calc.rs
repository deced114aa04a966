// idis-core/src/runtime/calc.rs
// ============================================================================
// Module: IDIS Calc Engine
// Description: Decimal-only calculations with reproducibility hashing.
// Purpose: Execute registered formulas behind the extraction gate.
// Dependencies: crate::{core, validators}
// ============================================================================

//! ## Overview
//! The calc engine resolves a formula from the registry, enforces the
//! extraction-confidence gate before any computation, validates required
//! inputs, merges optional defaults, runs the pure Decimal formula, and
//! quantizes the output with half-up rounding. The reproducibility hash is
//! SHA-256 over the canonical JSON of tenant, deal, calc type, formula hash,
//! code version, inputs, and output, with claim ids sorted so the hash is
//! independent of input ordering. The paired CalcSanad derives its grade
//! from material input grades; any FATAL (grade D) material input forces D.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::json;
use thiserror::Error;

use crate::core::calc::CalcInputs;
use crate::core::calc::CalcOutput;
use crate::core::calc::CalcSanad;
use crate::core::calc::CalcType;
use crate::core::calc::DeterministicCalculation;
use crate::core::calc::GradeExplanationEntry;
use crate::core::claim::Grade;
use crate::core::decimal::Dec;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::core::value_struct::Currency;
use crate::validators::extraction_gate::ExtractionGateBlockedError;
use crate::validators::extraction_gate::ExtractionGateInput;
use crate::validators::extraction_gate::enforce_extraction_gate;

/// Deployed engine version captured in every reproducibility hash.
pub const CODE_VERSION: &str = "0.1.0";

// ============================================================================
// SECTION: Input Grades
// ============================================================================

/// Grade and verification metadata for one input claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputGradeInfo {
    /// Input claim.
    pub claim_id: ClaimId,
    /// Sanad grade of the claim.
    pub grade: Grade,
    /// True when the input is material to the calc grade.
    pub is_material: bool,
    /// Extraction confidence in `[0, 1]`.
    pub extraction_confidence: Option<Dec>,
    /// Dabt score in `[0, 1]`.
    pub dhabt_score: Option<Dec>,
    /// Direct human-verification flag.
    pub is_human_verified: bool,
    /// Verification method.
    pub verification_method: crate::core::evidence::VerificationMethod,
}

impl InputGradeInfo {
    /// Converts to the extraction gate's input form.
    fn to_gate_input(&self) -> ExtractionGateInput {
        ExtractionGateInput {
            claim_id: self.claim_id.clone(),
            grade: self.grade,
            is_material: self.is_material,
            extraction_confidence: self.extraction_confidence.clone(),
            dhabt_score: self.dhabt_score.clone(),
            is_human_verified: self.is_human_verified,
            verification_method: self.verification_method,
        }
    }
}

// ============================================================================
// SECTION: Formula Registry
// ============================================================================

/// Pure formula function over named Decimal inputs.
pub type FormulaFn = fn(&BTreeMap<String, Dec>) -> Result<Dec, FormulaError>;

/// Formula evaluation failures.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Division by zero inside a formula.
    #[error("formula division by zero: {0}")]
    DivisionByZero(String),
    /// An input named by the spec was absent at evaluation time.
    #[error("formula input missing: {0}")]
    InputMissing(String),
}

/// Specification of one registered formula.
#[derive(Debug, Clone)]
pub struct FormulaSpec {
    /// Calc type this formula computes.
    pub calc_type: CalcType,
    /// Required input names.
    pub required_inputs: Vec<&'static str>,
    /// Optional input names with their defaults.
    pub optional_inputs: Vec<(&'static str, Dec)>,
    /// Fractional digits of the quantized output.
    pub output_precision: u32,
    /// SHA-256 over the canonical spec (excluding the function body).
    pub formula_hash: String,
    /// The formula function.
    pub fn_impl: FormulaFn,
}

/// Registry of deterministic formulas keyed by calc type.
#[derive(Debug, Clone, Default)]
pub struct FormulaRegistry {
    /// Registered specs.
    specs: BTreeMap<CalcType, FormulaSpec>,
}

impl FormulaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry with the built-in formula set.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            CalcType::Runway,
            vec!["cash_balance", "monthly_burn_rate"],
            Vec::new(),
            4,
            runway,
        );
        registry.register(
            CalcType::GrossMargin,
            vec!["revenue", "cogs"],
            Vec::new(),
            4,
            gross_margin,
        );
        registry.register(
            CalcType::BurnMultiple,
            vec!["net_burn", "net_new_arr"],
            Vec::new(),
            4,
            burn_multiple,
        );
        registry.register(
            CalcType::LtvCacRatio,
            vec!["ltv", "cac"],
            Vec::new(),
            4,
            ltv_cac_ratio,
        );
        registry
    }

    /// Registers a formula, computing its spec hash.
    pub fn register(
        &mut self,
        calc_type: CalcType,
        required_inputs: Vec<&'static str>,
        optional_inputs: Vec<(&'static str, Dec)>,
        output_precision: u32,
        fn_impl: FormulaFn,
    ) {
        let defaults: BTreeMap<&str, String> = optional_inputs
            .iter()
            .map(|(name, default)| (*name, default.to_string()))
            .collect();
        let mut required_sorted = required_inputs.clone();
        required_sorted.sort_unstable();
        let spec_json = json!({
            "calc_type": calc_type.as_str(),
            "required_inputs": required_sorted,
            "optional_inputs": defaults,
            "output_precision": output_precision,
        });
        let formula_hash = hash_canonical_json(&spec_json)
            .map(|digest| digest.as_str().to_string())
            .unwrap_or_default();
        self.specs.insert(
            calc_type,
            FormulaSpec {
                calc_type,
                required_inputs,
                optional_inputs,
                output_precision,
                formula_hash,
                fn_impl,
            },
        );
    }

    /// Returns the spec for a calc type.
    #[must_use]
    pub fn get(&self, calc_type: CalcType) -> Option<&FormulaSpec> {
        self.specs.get(&calc_type)
    }
}

// ============================================================================
// SECTION: Built-In Formulas
// ============================================================================

/// Fetches a named input or fails.
fn input<'a>(
    values: &'a BTreeMap<String, Dec>,
    name: &str,
) -> Result<&'a Dec, FormulaError> {
    values.get(name).ok_or_else(|| FormulaError::InputMissing(name.to_string()))
}

/// Months of runway: cash balance over monthly burn.
fn runway(values: &BTreeMap<String, Dec>) -> Result<Dec, FormulaError> {
    let cash = input(values, "cash_balance")?;
    let burn = input(values, "monthly_burn_rate")?;
    cash.checked_div(burn)
        .ok_or_else(|| FormulaError::DivisionByZero("monthly_burn_rate".to_string()))
}

/// Gross margin: (revenue - cogs) / revenue.
fn gross_margin(values: &BTreeMap<String, Dec>) -> Result<Dec, FormulaError> {
    let revenue = input(values, "revenue")?;
    let cogs = input(values, "cogs")?;
    (revenue - cogs)
        .checked_div(revenue)
        .ok_or_else(|| FormulaError::DivisionByZero("revenue".to_string()))
}

/// Burn multiple: net burn over net new ARR.
fn burn_multiple(values: &BTreeMap<String, Dec>) -> Result<Dec, FormulaError> {
    let burn = input(values, "net_burn")?;
    let arr = input(values, "net_new_arr")?;
    burn.checked_div(arr)
        .ok_or_else(|| FormulaError::DivisionByZero("net_new_arr".to_string()))
}

/// LTV:CAC ratio.
fn ltv_cac_ratio(values: &BTreeMap<String, Dec>) -> Result<Dec, FormulaError> {
    let ltv = input(values, "ltv")?;
    let cac = input(values, "cac")?;
    ltv.checked_div(cac).ok_or_else(|| FormulaError::DivisionByZero("cac".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Calc engine failures.
#[derive(Debug, Error)]
pub enum CalcError {
    /// Calc type not registered.
    #[error("unknown calc type: {0}")]
    UnknownCalcType(String),
    /// Required inputs missing.
    #[error("missing required inputs for {calc_type}: {}", missing.join(", "))]
    MissingInputs {
        /// Calc type attempted.
        calc_type: String,
        /// Missing input names.
        missing: Vec<String>,
    },
    /// Extraction gate blocked one or more inputs.
    #[error(transparent)]
    GateBlocked(#[from] ExtractionGateBlockedError),
    /// Formula evaluation failed.
    #[error(transparent)]
    Formula(#[from] FormulaError),
    /// Canonical hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Reproducibility hash mismatch: tamper or corruption.
    #[error("integrity check failed for calc {calc_id}: expected {expected}, computed {computed}")]
    Integrity {
        /// Affected calculation.
        calc_id: String,
        /// Stored hash prefix.
        expected: String,
        /// Recomputed hash prefix.
        computed: String,
    },
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Result of one engine run.
#[derive(Debug, Clone)]
pub struct CalcEngineResult {
    /// The reproducible calculation.
    pub calculation: DeterministicCalculation,
    /// Its provenance record.
    pub calc_sanad: CalcSanad,
}

/// Deterministic calculation engine with full provenance.
#[derive(Debug, Clone)]
pub struct CalcEngine {
    /// Formula registry.
    registry: FormulaRegistry,
    /// Deployed code version for hash preimages.
    code_version: String,
    /// Gate enforcement switch; disabled only for legacy migration paths.
    enforce_extraction_gate: bool,
}

impl CalcEngine {
    /// Creates an engine over a registry.
    #[must_use]
    pub fn new(registry: FormulaRegistry) -> Self {
        Self {
            registry,
            code_version: CODE_VERSION.to_string(),
            enforce_extraction_gate: true,
        }
    }

    /// Overrides the code version (tests and migration tooling).
    #[must_use]
    pub fn with_code_version(mut self, code_version: impl Into<String>) -> Self {
        self.code_version = code_version.into();
        self
    }

    /// Disables the extraction gate; legacy migration only.
    #[must_use]
    pub const fn without_extraction_gate(mut self) -> Self {
        self.enforce_extraction_gate = false;
        self
    }

    /// Runs a calculation.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::GateBlocked`] before any computation when an
    /// input fails the extraction gate, [`CalcError::MissingInputs`] when a
    /// required input is absent, and formula or hashing failures otherwise.
    #[allow(
        clippy::too_many_arguments,
        reason = "The run signature mirrors the hash preimage fields one to one."
    )]
    pub fn run(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        calc_type: CalcType,
        input_values: BTreeMap<String, Dec>,
        input_grades: &[InputGradeInfo],
        metadata: BTreeMap<String, String>,
        now: Timestamp,
    ) -> Result<CalcEngineResult, CalcError> {
        let spec = self
            .registry
            .get(calc_type)
            .ok_or_else(|| CalcError::UnknownCalcType(calc_type.as_str().to_string()))?;

        // Gate first: no partial computation behind blocked inputs.
        if self.enforce_extraction_gate && !input_grades.is_empty() {
            let gate_inputs: Vec<ExtractionGateInput> =
                input_grades.iter().map(InputGradeInfo::to_gate_input).collect();
            enforce_extraction_gate(&gate_inputs, calc_type.as_str())?;
        }

        let missing: Vec<String> = spec
            .required_inputs
            .iter()
            .filter(|name| !input_values.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CalcError::MissingInputs {
                calc_type: calc_type.as_str().to_string(),
                missing,
            });
        }

        let mut merged: BTreeMap<String, Dec> = spec
            .optional_inputs
            .iter()
            .map(|(name, default)| ((*name).to_string(), default.clone()))
            .collect();
        merged.extend(input_values);

        let raw_output = (spec.fn_impl)(&merged)?;
        let primary_value = raw_output.quantize(spec.output_precision);

        let mut claim_ids: Vec<ClaimId> =
            input_grades.iter().map(|grade| grade.claim_id.clone()).collect();
        claim_ids.sort();

        let currency = metadata.get("currency").and_then(|code| parse_currency(code));
        let inputs = CalcInputs {
            claim_ids,
            values: merged,
            metadata: metadata.clone(),
        };
        let output = CalcOutput {
            primary_value,
            secondary_values: BTreeMap::new(),
            unit: metadata.get("unit").cloned(),
            currency,
        };

        let reproducibility_hash = self.compute_reproducibility_hash(
            tenant_id,
            deal_id,
            calc_type,
            &spec.formula_hash,
            &self.code_version,
            &inputs,
            &output,
        )?;

        let calc_id = CalcId::mint();
        let calculation = DeterministicCalculation {
            calc_id: calc_id.clone(),
            tenant_id: tenant_id.clone(),
            deal_id: deal_id.clone(),
            calc_type,
            inputs,
            formula_hash: spec.formula_hash.clone(),
            code_version: self.code_version.clone(),
            output,
            reproducibility_hash,
            created_at: now,
            updated_at: now,
        };

        let calc_sanad = derive_calc_sanad(tenant_id, &calc_id, input_grades, now);

        Ok(CalcEngineResult {
            calculation,
            calc_sanad,
        })
    }

    /// Recomputes and checks the reproducibility hash of a calculation.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Integrity`] on mismatch (tamper detected).
    pub fn verify_reproducibility(
        &self,
        calculation: &DeterministicCalculation,
    ) -> Result<(), CalcError> {
        let spec = self.registry.get(calculation.calc_type).ok_or_else(|| {
            CalcError::UnknownCalcType(calculation.calc_type.as_str().to_string())
        })?;
        let computed = self.compute_reproducibility_hash(
            &calculation.tenant_id,
            &calculation.deal_id,
            calculation.calc_type,
            &spec.formula_hash,
            &calculation.code_version,
            &calculation.inputs,
            &calculation.output,
        )?;
        if computed != calculation.reproducibility_hash {
            return Err(CalcError::Integrity {
                calc_id: calculation.calc_id.to_string(),
                expected: calculation.reproducibility_hash.chars().take(16).collect(),
                computed: computed.chars().take(16).collect(),
            });
        }
        Ok(())
    }

    /// Computes the reproducibility hash over the canonical preimage.
    #[allow(
        clippy::too_many_arguments,
        reason = "The preimage fields are spelled out so the hash contract stays visible."
    )]
    fn compute_reproducibility_hash(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        calc_type: CalcType,
        formula_hash: &str,
        code_version: &str,
        inputs: &CalcInputs,
        output: &CalcOutput,
    ) -> Result<String, CalcError> {
        let mut claim_ids: Vec<String> =
            inputs.claim_ids.iter().map(ToString::to_string).collect();
        claim_ids.sort();
        let values: BTreeMap<&String, String> =
            inputs.values.iter().map(|(name, value)| (name, value.to_string())).collect();
        let secondary: BTreeMap<&String, String> = output
            .secondary_values
            .iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();

        let preimage = json!({
            "calc_type": calc_type.as_str(),
            "code_version": code_version,
            "deal_id": deal_id.as_str(),
            "formula_hash": formula_hash,
            "inputs": {
                "claim_ids": claim_ids,
                "metadata": inputs.metadata,
                "values": values,
            },
            "output": {
                "currency": output.currency,
                "primary_value": output.primary_value.to_string(),
                "secondary_values": secondary,
                "unit": output.unit,
            },
            "tenant_id": tenant_id.as_str(),
        });
        Ok(hash_canonical_json(&preimage)?.as_str().to_string())
    }
}

// ============================================================================
// SECTION: Calc Sanad Derivation
// ============================================================================

/// Derives the CalcSanad grade from input grades.
///
/// `calc_grade` is the worst material input grade; with no material inputs it
/// falls back to the worst grade across all inputs, and with no inputs at all
/// it defaults to A.
fn derive_calc_sanad(
    tenant_id: &TenantId,
    calc_id: &CalcId,
    input_grades: &[InputGradeInfo],
    now: Timestamp,
) -> CalcSanad {
    let mut explanation: Vec<GradeExplanationEntry> = Vec::new();

    let (input_min_grade, calc_grade) = if input_grades.is_empty() {
        explanation.push(GradeExplanationEntry {
            step: "No input claims; defaulting to grade A".to_string(),
            impact: Some("grade = A".to_string()),
            claim_id: None,
            input_grade: None,
            is_material: None,
        });
        (Grade::A, Grade::A)
    } else {
        let input_min =
            Grade::min_grade(input_grades.iter().map(|info| info.grade)).unwrap_or(Grade::A);

        for info in input_grades {
            explanation.push(GradeExplanationEntry {
                step: format!(
                    "Input {} grade {} ({})",
                    info.claim_id,
                    info.grade.as_str(),
                    if info.is_material { "material" } else { "non-material" }
                ),
                impact: None,
                claim_id: Some(info.claim_id.clone()),
                input_grade: Some(info.grade),
                is_material: Some(info.is_material),
            });
        }

        let material: Vec<&InputGradeInfo> =
            input_grades.iter().filter(|info| info.is_material).collect();
        let non_material_count = input_grades.len() - material.len();
        if non_material_count > 0 {
            explanation.push(GradeExplanationEntry {
                step: format!("{non_material_count} non-material input(s) excluded"),
                impact: Some("non-material grades do not affect calc_grade".to_string()),
                claim_id: None,
                input_grade: None,
                is_material: None,
            });
        }

        let calc_grade = if material.is_empty() {
            explanation.push(GradeExplanationEntry {
                step: "No material inputs; using min of all inputs as fallback".to_string(),
                impact: Some(format!("calc_grade = {}", input_min.as_str())),
                claim_id: None,
                input_grade: None,
                is_material: None,
            });
            input_min
        } else {
            let grade = Grade::min_grade(material.iter().map(|info| info.grade))
                .unwrap_or(Grade::A);
            explanation.push(GradeExplanationEntry {
                step: format!("calc_grade derived from {} material input(s)", material.len()),
                impact: Some(format!("calc_grade = {} (min of material grades)", grade.as_str())),
                claim_id: None,
                input_grade: None,
                is_material: None,
            });
            grade
        };

        (input_min, calc_grade)
    };

    let mut input_claim_ids: Vec<ClaimId> =
        input_grades.iter().map(|info| info.claim_id.clone()).collect();
    input_claim_ids.sort();

    CalcSanad {
        calc_sanad_id: SanadId::mint(),
        tenant_id: tenant_id.clone(),
        calc_id: calc_id.clone(),
        input_claim_ids,
        input_min_sanad_grade: input_min_grade,
        calc_grade,
        explanation,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a currency code from calc metadata.
fn parse_currency(code: &str) -> Option<Currency> {
    match code.to_ascii_uppercase().as_str() {
        "USD" => Some(Currency::USD),
        "EUR" => Some(Currency::EUR),
        "GBP" => Some(Currency::GBP),
        "SAR" => Some(Currency::SAR),
        "AED" => Some(Currency::AED),
        _ => None,
    }
}
