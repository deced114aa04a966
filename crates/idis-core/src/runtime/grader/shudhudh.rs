// idis-core/src/runtime/grader/shudhudh.rs
// ============================================================================
// Module: IDIS Shudhudh Detection
// Description: Reconciliation-first anomaly detection across sources.
// Purpose: Flag lower-tier contradictions only after reconciliation fails.
// Dependencies: crate::core::{decimal, evidence}, crate::runtime::grader::tiers
// ============================================================================

//! ## Overview
//! Before flagging an anomaly, the detector attempts reconciliation in a
//! fixed order: rounding (values within 1% of their mean), unit conversion
//! (values differing by ~1000x or ~1,000,000x with explicit unit labels),
//! and time-window labels (differently-labelled windows are not comparable).
//! Reconciled differences produce at most a MINOR note. Only when
//! reconciliation fails and a support-only tier source contradicts the
//! tier-weighted consensus by more than 5% is a MAJOR `SHUDHUDH_ANOMALY`
//! raised. All arithmetic is Decimal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::decimal::Dec;
use crate::core::defect::DefectSeverity;
use crate::core::evidence::EvidenceItem;
use crate::runtime::grader::tiers::TierUsage;
use crate::runtime::grader::tiers::assign_source_tier;

// ============================================================================
// SECTION: Observed Values
// ============================================================================

/// One observed value with its unit and window context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedValue {
    /// Raw text as observed.
    pub raw: String,
    /// Parsed numeric value, when the text is numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<Dec>,
    /// Explicit unit label (`K`, `M`, `B`), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    /// Time-window label (`FY`, `LTM`), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<String>,
}

impl ObservedValue {
    /// Parses an observed value from raw text.
    ///
    /// Strips currency symbols and separators, resolves `K`/`M`/`B` scale
    /// suffixes into the numeric value while retaining the label, and tags
    /// `FY`/`LTM` window markers.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.to_ascii_uppercase();
        let time_window = if upper.contains("FY") || upper.contains("FISCAL") {
            Some("FY".to_string())
        } else if upper.contains("LTM") || upper.contains("TTM") {
            Some("LTM".to_string())
        } else {
            None
        };

        let cleaned: String = raw
            .chars()
            .filter(|ch| !matches!(ch, '$' | '€' | '£' | ',' | ' '))
            .collect();

        let (base, unit_label, multiplier) = match cleaned.to_ascii_uppercase() {
            ref text if text.ends_with('K') => {
                (cleaned[..cleaned.len() - 1].to_string(), Some("K"), 1_000_i64)
            }
            ref text if text.ends_with('M') => {
                (cleaned[..cleaned.len() - 1].to_string(), Some("M"), 1_000_000_i64)
            }
            ref text if text.ends_with('B') => {
                (cleaned[..cleaned.len() - 1].to_string(), Some("B"), 1_000_000_000_i64)
            }
            _ => (cleaned.clone(), None, 1_i64),
        };

        let numeric = Dec::parse(&base)
            .ok()
            .map(|value| &value * &Dec::from_i64(multiplier));

        Self {
            raw: raw.to_string(),
            numeric,
            unit_label: unit_label.map(str::to_string),
            time_window,
        }
    }
}

// ============================================================================
// SECTION: Result Model
// ============================================================================

/// Reconciliation strategies attempted before flagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationType {
    /// Values inside rounding tolerance of their mean.
    Rounding,
    /// Values differing by a labelled scale factor.
    UnitConversion,
    /// Values from different labelled time windows.
    TimeWindow,
}

/// One reconciliation attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAttempt {
    /// Strategy attempted.
    pub reconciliation_type: ReconciliationType,
    /// True when the strategy explained the divergence.
    pub success: bool,
    /// Explanation of the outcome.
    pub explanation: String,
}

/// Outcome of Shudhudh detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShudhudhResult {
    /// True when an unreconciled anomaly was found.
    pub has_anomaly: bool,
    /// Defect code, for anomalies and reconciliation notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_code: Option<String>,
    /// Severity of the finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DefectSeverity>,
    /// Finding description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attempts made, in order.
    pub reconciliation_attempts: Vec<ReconciliationAttempt>,
    /// Tier-weighted consensus value, when computable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_value: Option<Dec>,
}

impl ShudhudhResult {
    /// Builds a no-anomaly result.
    fn clean(attempts: Vec<ReconciliationAttempt>, consensus: Option<Dec>) -> Self {
        Self {
            has_anomaly: false,
            defect_code: None,
            severity: None,
            description: None,
            reconciliation_attempts: attempts,
            consensus_value: consensus,
        }
    }
}

// ============================================================================
// SECTION: Reconciliation
// ============================================================================

/// Rounding tolerance as a fraction of the mean.
fn rounding_tolerance() -> Dec {
    Dec::parse("0.01").unwrap_or_else(|_| Dec::zero())
}

/// Contradiction threshold against the consensus.
fn contradiction_threshold() -> Dec {
    Dec::parse("0.05").unwrap_or_else(|_| Dec::zero())
}

/// Attempts rounding reconciliation: all values within 1% of their mean.
fn attempt_rounding(values: &[&Dec]) -> ReconciliationAttempt {
    if values.len() < 2 {
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::Rounding,
            success: false,
            explanation: "Insufficient numeric values for rounding check".to_string(),
        };
    }
    let mut sum = Dec::zero();
    for value in values {
        sum = &sum + value;
    }
    let count = i64::try_from(values.len()).unwrap_or(i64::MAX);
    let Some(mean) = sum.checked_div(&Dec::from_i64(count)) else {
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::Rounding,
            success: false,
            explanation: "Mean is zero but values differ".to_string(),
        };
    };
    if mean.is_zero() {
        let all_zero = values.iter().all(|value| value.is_zero());
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::Rounding,
            success: all_zero,
            explanation: if all_zero {
                "All values are zero".to_string()
            } else {
                "Mean is zero but values differ".to_string()
            },
        };
    }

    let tolerance = rounding_tolerance();
    let within = values.iter().all(|value| {
        (*value - &mean)
            .abs()
            .checked_div(&mean.abs())
            .is_some_and(|deviation| deviation <= tolerance)
    });

    ReconciliationAttempt {
        reconciliation_type: ReconciliationType::Rounding,
        success: within,
        explanation: if within {
            "Values within 1% tolerance, treated as reconciled".to_string()
        } else {
            "Values exceed 1% rounding tolerance".to_string()
        },
    }
}

/// Attempts unit-conversion reconciliation: ~1e3 or ~1e6 ratio with labels.
fn attempt_unit_conversion(observed: &[&ObservedValue]) -> ReconciliationAttempt {
    let labelled: Vec<&ObservedValue> = observed
        .iter()
        .filter(|value| value.numeric.is_some())
        .copied()
        .collect();
    if labelled.len() < 2 {
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::UnitConversion,
            success: false,
            explanation: "Insufficient numeric values for unit reconciliation".to_string(),
        };
    }

    for (i, left) in labelled.iter().enumerate() {
        for right in labelled.iter().skip(i + 1) {
            let (Some(a), Some(b)) = (&left.numeric, &right.numeric) else {
                continue;
            };
            if a.is_zero() || b.is_zero() {
                continue;
            }
            let Some(ratio) = a.abs().checked_div(&b.abs()) else {
                continue;
            };
            let ratio = if ratio < Dec::from_i64(1) {
                match Dec::from_i64(1).checked_div(&ratio) {
                    Some(inverted) => inverted,
                    None => continue,
                }
            } else {
                ratio
            };
            let both_labelled = left.unit_label.is_some() && right.unit_label.is_some();
            let thousand = ratio >= Dec::from_i64(999) && ratio <= Dec::from_i64(1001);
            let million =
                ratio >= Dec::from_i64(999_000) && ratio <= Dec::from_i64(1_001_000);
            if both_labelled && (thousand || million) {
                return ReconciliationAttempt {
                    reconciliation_type: ReconciliationType::UnitConversion,
                    success: true,
                    explanation: format!(
                        "Values differ by ~{} with explicit unit labels, reconciled",
                        if thousand { "1000x" } else { "1Mx" }
                    ),
                };
            }
        }
    }

    ReconciliationAttempt {
        reconciliation_type: ReconciliationType::UnitConversion,
        success: false,
        explanation: "No unit conversion pattern detected".to_string(),
    }
}

/// Attempts time-window reconciliation: distinct labels are not comparable.
fn attempt_time_window(observed: &[&ObservedValue]) -> ReconciliationAttempt {
    let windows: Vec<&String> =
        observed.iter().filter_map(|value| value.time_window.as_ref()).collect();
    if windows.is_empty() {
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::TimeWindow,
            success: false,
            explanation: "No time window labels found".to_string(),
        };
    }
    let mut unique: Vec<&String> = windows.clone();
    unique.sort();
    unique.dedup();
    if unique.len() > 1 {
        return ReconciliationAttempt {
            reconciliation_type: ReconciliationType::TimeWindow,
            success: true,
            explanation: "Different time windows detected, values not comparable".to_string(),
        };
    }
    ReconciliationAttempt {
        reconciliation_type: ReconciliationType::TimeWindow,
        success: false,
        explanation: "Same time window, no reconciliation needed".to_string(),
    }
}

// ============================================================================
// SECTION: Consensus
// ============================================================================

/// Computes the tier-weighted consensus over observed values.
fn compute_consensus(pairs: &[(&ObservedValue, &EvidenceItem)]) -> Option<Dec> {
    let mut weighted_sum = Dec::zero();
    let mut total_weight = Dec::zero();
    let mut plain_sum = Dec::zero();
    let mut count = 0_i64;

    for (observed, source) in pairs {
        let Some(numeric) = &observed.numeric else {
            continue;
        };
        let weight = assign_source_tier(Some(source)).weight();
        weighted_sum = &weighted_sum + &(numeric * &weight);
        total_weight = &total_weight + &weight;
        plain_sum = &plain_sum + numeric;
        count += 1;
    }

    if count == 0 {
        return None;
    }
    weighted_sum
        .checked_div(&total_weight)
        .or_else(|| plain_sum.checked_div(&Dec::from_i64(count)))
}

/// Checks whether a value contradicts the consensus beyond the threshold.
fn contradicts(value: &Dec, consensus: &Dec) -> bool {
    if consensus.is_zero() {
        return !value.is_zero();
    }
    (value - consensus)
        .abs()
        .checked_div(&consensus.abs())
        .is_some_and(|deviation| deviation > contradiction_threshold())
}

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Detects Shudhudh over paired observed values and their sources.
///
/// Pairs are evaluated in `evidence_id` order so detection never depends on
/// caller ordering.
#[must_use]
pub fn detect_shudhudh(pairs: &[(ObservedValue, EvidenceItem)]) -> ShudhudhResult {
    if pairs.len() < 2 {
        let consensus = pairs.first().and_then(|(observed, _)| observed.numeric.clone());
        return ShudhudhResult::clean(Vec::new(), consensus);
    }

    let mut ordered: Vec<(&ObservedValue, &EvidenceItem)> =
        pairs.iter().map(|(observed, source)| (observed, source)).collect();
    ordered.sort_by(|a, b| a.1.evidence_id.cmp(&b.1.evidence_id));

    let observed: Vec<&ObservedValue> = ordered.iter().map(|(value, _)| *value).collect();
    let numerics: Vec<&Dec> =
        observed.iter().filter_map(|value| value.numeric.as_ref()).collect();

    let mut attempts = Vec::new();

    let rounding = attempt_rounding(&numerics);
    let rounding_success = rounding.success;
    attempts.push(rounding);
    if rounding_success {
        let consensus = compute_consensus(&ordered);
        return ShudhudhResult::clean(attempts, consensus);
    }

    let unit = attempt_unit_conversion(&observed);
    if unit.success {
        let explanation = unit.explanation.clone();
        attempts.push(unit);
        return ShudhudhResult {
            has_anomaly: false,
            defect_code: Some("SHUDHUDH_UNIT_MISMATCH".to_string()),
            severity: Some(DefectSeverity::Minor),
            description: Some(explanation),
            reconciliation_attempts: attempts,
            consensus_value: None,
        };
    }
    attempts.push(unit);

    let window = attempt_time_window(&observed);
    if window.success {
        let explanation = window.explanation.clone();
        attempts.push(window);
        return ShudhudhResult {
            has_anomaly: false,
            defect_code: Some("SHUDHUDH_TIME_WINDOW".to_string()),
            severity: Some(DefectSeverity::Minor),
            description: Some(explanation),
            reconciliation_attempts: attempts,
            consensus_value: None,
        };
    }
    attempts.push(window);

    let consensus = compute_consensus(&ordered);
    if let Some(consensus_value) = &consensus {
        for (value, source) in &ordered {
            let tier = assign_source_tier(Some(source));
            let Some(numeric) = &value.numeric else {
                continue;
            };
            if tier.usage() == TierUsage::SupportOnly && contradicts(numeric, consensus_value) {
                return ShudhudhResult {
                    has_anomaly: true,
                    defect_code: Some("SHUDHUDH_ANOMALY".to_string()),
                    severity: Some(DefectSeverity::Major),
                    description: Some(format!(
                        "Lower-tier source ({}) contradicts consensus: {} vs {}",
                        tier.as_str(),
                        value.raw,
                        consensus_value.quantize(4),
                    )),
                    reconciliation_attempts: attempts,
                    consensus_value: consensus,
                };
            }
        }
    }

    ShudhudhResult::clean(attempts, consensus)
}
