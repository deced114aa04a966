// idis-core/tests/determinism.rs
// ============================================================================
// Module: Determinism Property Tests
// Description: Hashing and decimal laws under generated inputs.
// ============================================================================
//! ## Overview
//! Property tests for the canonical hashing choke point and the Decimal
//! wrapper: key-order independence, permutation-invariant calc hashes, and
//! quantization stability.

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
use idis_core::core::hashing::hash_canonical_json;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::time::Timestamp;
use idis_core::runtime::calc::CalcEngine;
use idis_core::runtime::calc::FormulaRegistry;
use idis_core::runtime::calc::InputGradeInfo;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// SECTION: Canonical JSON
// ============================================================================

proptest! {
    /// Canonical hashing ignores object key insertion order.
    #[test]
    fn prop_hash_ignores_key_order(a in 0_i64..10_000, b in 0_i64..10_000) {
        let forward = json!({"alpha": a, "beta": b});
        let backward = json!({"beta": b, "alpha": a});
        prop_assert_eq!(
            hash_canonical_json(&forward).unwrap(),
            hash_canonical_json(&backward).unwrap()
        );
    }

    /// Distinct payloads produce distinct digests.
    #[test]
    fn prop_hash_distinguishes_values(a in 0_i64..10_000, b in 0_i64..10_000) {
        prop_assume!(a != b);
        let left = json!({"value": a});
        let right = json!({"value": b});
        prop_assert_ne!(
            hash_canonical_json(&left).unwrap(),
            hash_canonical_json(&right).unwrap()
        );
    }
}

// ============================================================================
// SECTION: Decimal Laws
// ============================================================================

proptest! {
    /// Quantization is idempotent at the same precision.
    #[test]
    fn prop_quantize_idempotent(numerator in 1_i64..1_000_000, denominator in 1_i64..10_000) {
        let value = Dec::from_i64(numerator)
            .checked_div(&Dec::from_i64(denominator))
            .unwrap();
        let once = value.quantize(4);
        let twice = once.quantize(4);
        prop_assert_eq!(once.to_string(), twice.to_string());
    }

    /// String round trips preserve equality.
    #[test]
    fn prop_decimal_string_round_trip(value in 0_i64..1_000_000_000) {
        let original = Dec::from_i64(value);
        let reparsed = Dec::parse(&original.to_string()).unwrap();
        prop_assert_eq!(original, reparsed);
    }
}

// ============================================================================
// SECTION: Calc Hash Permutation Law
// ============================================================================

/// Grade info passing the extraction gate.
fn passing_grade(claim_id: &str) -> InputGradeInfo {
    InputGradeInfo {
        claim_id: ClaimId::new(claim_id),
        grade: Grade::A,
        is_material: true,
        extraction_confidence: Some(Dec::parse("0.97").unwrap()),
        dhabt_score: Some(Dec::parse("0.95").unwrap()),
        is_human_verified: false,
        verification_method: VerificationMethod::None,
    }
}

proptest! {
    /// The reproducibility hash is invariant under any claim-id ordering.
    #[test]
    fn prop_calc_hash_permutation_invariant(shuffle in proptest::sample::subsequence(
        vec!["c-1", "c-2", "c-3", "c-4"], 0..=4)) {
        let engine = CalcEngine::new(FormulaRegistry::with_builtins());
        let now = Timestamp::parse("2026-01-11T12:00:00Z").unwrap();
        let inputs = BTreeMap::from([
            ("cash_balance".to_string(), Dec::parse("1000000").unwrap()),
            ("monthly_burn_rate".to_string(), Dec::parse("40000").unwrap()),
        ]);

        let canonical_order: Vec<InputGradeInfo> =
            ["c-1", "c-2", "c-3", "c-4"].iter().map(|id| passing_grade(id)).collect();
        let shuffled_order: Vec<InputGradeInfo> = shuffle
            .iter()
            .map(|id| passing_grade(id))
            .chain(
                ["c-1", "c-2", "c-3", "c-4"]
                    .iter()
                    .filter(|id| !shuffle.contains(&(**id)))
                    .map(|id| passing_grade(id)),
            )
            .collect();

        let first = engine
            .run(
                &TenantId::new("t-1"),
                &DealId::new("d-1"),
                CalcType::Runway,
                inputs.clone(),
                &canonical_order,
                BTreeMap::new(),
                now,
            )
            .unwrap();
        let second = engine
            .run(
                &TenantId::new("t-1"),
                &DealId::new("d-1"),
                CalcType::Runway,
                inputs,
                &shuffled_order,
                BTreeMap::new(),
                now,
            )
            .unwrap();
        prop_assert_eq!(
            first.calculation.reproducibility_hash,
            second.calculation.reproducibility_hash
        );
    }
}
