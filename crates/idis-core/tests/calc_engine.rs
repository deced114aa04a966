// idis-core/tests/calc_engine.rs
// ============================================================================
// Module: Calc Engine Tests
// Description: Reproducibility, gating, and grade-derivation tests.
// ============================================================================
//! ## Overview
//! Validates Decimal-only execution, the reproducibility hash contract
//! (permutation-invariant, input-sensitive), the extraction gate boundary,
//! and CalcSanad grade derivation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use idis_core::core::calc::CalcType;
use idis_core::core::claim::Grade;
use idis_core::core::decimal::Dec;
use idis_core::core::evidence::VerificationMethod;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::time::Timestamp;
use idis_core::runtime::calc::CalcEngine;
use idis_core::runtime::calc::CalcError;
use idis_core::runtime::calc::FormulaRegistry;
use idis_core::runtime::calc::InputGradeInfo;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Pinned timestamp for reproducible records.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// Engine over the built-in registry.
fn engine() -> CalcEngine {
    CalcEngine::new(FormulaRegistry::with_builtins())
}

/// Grade info passing the extraction gate.
fn passing_grade(claim_id: &str, grade: Grade, material: bool) -> InputGradeInfo {
    InputGradeInfo {
        claim_id: ClaimId::new(claim_id),
        grade,
        is_material: material,
        extraction_confidence: Some(Dec::parse("0.97").unwrap()),
        dhabt_score: Some(Dec::parse("0.95").unwrap()),
        is_human_verified: false,
        verification_method: VerificationMethod::None,
    }
}

/// Runway inputs: cash 1,000,000 and burn 50,000.
fn runway_inputs() -> BTreeMap<String, Dec> {
    BTreeMap::from([
        ("cash_balance".to_string(), Dec::parse("1000000").unwrap()),
        ("monthly_burn_rate".to_string(), Dec::parse("50000").unwrap()),
    ])
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Tests the runway happy path quantizes to four digits.
#[test]
fn test_runway_primary_value() {
    let result = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-1", Grade::A, true), passing_grade("c-2", Grade::A, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_eq!(result.calculation.output.primary_value.to_string(), "20.0000");
}

/// Tests the reproducibility hash is invariant under claim-id permutation.
#[test]
fn test_hash_invariant_under_claim_permutation() {
    let forward = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-1", Grade::A, true), passing_grade("c-2", Grade::A, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    let reversed = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-2", Grade::A, true), passing_grade("c-1", Grade::A, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_eq!(
        forward.calculation.reproducibility_hash,
        reversed.calculation.reproducibility_hash
    );
}

/// Tests the hash changes when any input value changes.
#[test]
fn test_hash_changes_with_input_value() {
    let base = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-1", Grade::A, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    let mut changed_inputs = runway_inputs();
    changed_inputs.insert("monthly_burn_rate".to_string(), Dec::parse("50001").unwrap());
    let changed = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            changed_inputs,
            &[passing_grade("c-1", Grade::A, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_ne!(base.calculation.reproducibility_hash, changed.calculation.reproducibility_hash);
}

/// Tests verify_reproducibility accepts intact calcs and rejects tampering.
#[test]
fn test_verify_reproducibility() {
    let engine = engine();
    let result = engine
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-1", Grade::B, true)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    engine.verify_reproducibility(&result.calculation).unwrap();

    let mut tampered = result.calculation.clone();
    tampered.output.primary_value = Dec::parse("21.0000").unwrap();
    let verdict = engine.verify_reproducibility(&tampered);
    assert!(matches!(verdict, Err(CalcError::Integrity { .. })));
}

/// Tests missing required inputs fail with the input list.
#[test]
fn test_missing_required_inputs() {
    let result = engine().run(
        &TenantId::new("t-1"),
        &DealId::new("d-1"),
        CalcType::Runway,
        BTreeMap::from([("cash_balance".to_string(), Dec::parse("1000000").unwrap())]),
        &[passing_grade("c-1", Grade::A, true)],
        BTreeMap::new(),
        now(),
    );
    match result {
        Err(CalcError::MissingInputs { missing, .. }) => {
            assert_eq!(missing, vec!["monthly_burn_rate".to_string()]);
        }
        other => panic!("expected missing inputs, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Extraction Gate
// ============================================================================

/// Tests a low-confidence input blocks the calc and lists the claim.
#[test]
fn test_gate_blocks_low_confidence() {
    let blocked_input = InputGradeInfo {
        claim_id: ClaimId::new("c-low"),
        grade: Grade::B,
        is_material: true,
        extraction_confidence: Some(Dec::parse("0.94").unwrap()),
        dhabt_score: Some(Dec::parse("0.95").unwrap()),
        is_human_verified: false,
        verification_method: VerificationMethod::None,
    };
    let result = engine().run(
        &TenantId::new("t-1"),
        &DealId::new("d-1"),
        CalcType::Runway,
        runway_inputs(),
        &[blocked_input],
        BTreeMap::new(),
        now(),
    );
    match result {
        Err(CalcError::GateBlocked(error)) => {
            assert_eq!(error.blocked.len(), 1);
            assert_eq!(error.blocked[0].claim_id, ClaimId::new("c-low"));
        }
        other => panic!("expected gate block, got {other:?}"),
    }
}

/// Tests the exact boundary: 0.95 confidence with 0.90 dhabt is allowed.
#[test]
fn test_gate_boundary_values_allowed() {
    let boundary = InputGradeInfo {
        claim_id: ClaimId::new("c-boundary"),
        grade: Grade::B,
        is_material: true,
        extraction_confidence: Some(Dec::parse("0.95").unwrap()),
        dhabt_score: Some(Dec::parse("0.90").unwrap()),
        is_human_verified: false,
        verification_method: VerificationMethod::None,
    };
    let result = engine().run(
        &TenantId::new("t-1"),
        &DealId::new("d-1"),
        CalcType::Runway,
        runway_inputs(),
        &[boundary],
        BTreeMap::new(),
        now(),
    );
    assert!(result.is_ok());
}

/// Tests human verification bypasses missing scores.
#[test]
fn test_gate_human_verification_bypass() {
    let verified = InputGradeInfo {
        claim_id: ClaimId::new("c-human"),
        grade: Grade::B,
        is_material: true,
        extraction_confidence: None,
        dhabt_score: None,
        is_human_verified: false,
        verification_method: VerificationMethod::HumanVerified,
    };
    let result = engine().run(
        &TenantId::new("t-1"),
        &DealId::new("d-1"),
        CalcType::Runway,
        runway_inputs(),
        &[verified],
        BTreeMap::new(),
        now(),
    );
    assert!(result.is_ok());
}

// ============================================================================
// SECTION: Calc Sanad
// ============================================================================

/// Tests calc grade derives from material inputs only.
#[test]
fn test_calc_grade_from_material_inputs() {
    let result = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[
                passing_grade("c-1", Grade::B, true),
                passing_grade("c-2", Grade::D, false),
            ],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_eq!(result.calc_sanad.calc_grade, Grade::B);
    assert_eq!(result.calc_sanad.input_min_sanad_grade, Grade::D);
}

/// Tests a FATAL (grade D) material input forces calc grade D.
#[test]
fn test_fatal_material_input_forces_d() {
    let result = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[
                passing_grade("c-1", Grade::A, true),
                passing_grade("c-2", Grade::D, true),
            ],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_eq!(result.calc_sanad.calc_grade, Grade::D);
}

/// Tests the no-material-inputs fallback to the overall minimum.
#[test]
fn test_no_material_inputs_fallback() {
    let result = engine()
        .run(
            &TenantId::new("t-1"),
            &DealId::new("d-1"),
            CalcType::Runway,
            runway_inputs(),
            &[passing_grade("c-1", Grade::C, false)],
            BTreeMap::new(),
            now(),
        )
        .unwrap();
    assert_eq!(result.calc_sanad.calc_grade, Grade::C);
}
