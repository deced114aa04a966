// idis-core/src/runtime/grader/tawatur.rs
// ============================================================================
// Module: IDIS Tawatur Assessment
// Description: Independence-cluster corroboration counting.
// Purpose: Decide NONE/AHAD_1/AHAD_2/MUTAWATIR and the collusion risk.
// Dependencies: crate::core::{decimal, evidence, sanad}
// ============================================================================

//! ## Overview
//! Corroboration counts chains whose root sources belong to distinct
//! independence clusters, not raw source counts: five press articles quoting
//! one founder statement corroborate as a single chain. Three or more
//! independent clusters reach MUTAWATIR, which upgrades the grade by one when
//! no MAJOR defect is present. Collusion risk is the fraction of sources
//! that share a cluster with another source.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::decimal::Dec;
use crate::core::evidence::EvidenceItem;
use crate::core::sanad::CorroborationLevel;

// ============================================================================
// SECTION: Result Model
// ============================================================================

/// Outcome of the Tawatur assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TawaturResult {
    /// Corroboration status.
    pub status: CorroborationLevel,
    /// Number of distinct independence clusters observed.
    pub independent_count: u32,
    /// Fraction of sources sharing a cluster with another source.
    pub collusion_risk: Dec,
}

// ============================================================================
// SECTION: Assessment
// ============================================================================

/// Assesses corroboration over the sources of a sanad.
///
/// Sources are clustered by `independence_cluster`; a source without a
/// cluster label counts as its own cluster keyed by its evidence id.
#[must_use]
pub fn assess_tawatur(sources: &[EvidenceItem]) -> TawaturResult {
    if sources.is_empty() {
        return TawaturResult {
            status: CorroborationLevel::None,
            independent_count: 0,
            collusion_risk: Dec::zero(),
        };
    }

    let mut cluster_sizes: BTreeMap<String, u32> = BTreeMap::new();
    for source in sources {
        let cluster = source
            .independence_cluster
            .clone()
            .unwrap_or_else(|| source.evidence_id.to_string());
        *cluster_sizes.entry(cluster).or_insert(0) += 1;
    }

    let independent_count = u32::try_from(cluster_sizes.len()).unwrap_or(u32::MAX);
    let status = match independent_count {
        0 => CorroborationLevel::None,
        1 => CorroborationLevel::Ahad1,
        2 => CorroborationLevel::Ahad2,
        _ => CorroborationLevel::Mutawatir,
    };

    let clustered: u32 = cluster_sizes.values().filter(|size| **size > 1).sum();
    let total = u32::try_from(sources.len()).unwrap_or(u32::MAX);
    let collusion_risk = Dec::from_i64(i64::from(clustered))
        .checked_div(&Dec::from_i64(i64::from(total)))
        .unwrap_or_else(Dec::zero)
        .quantize(4);

    TawaturResult {
        status,
        independent_count,
        collusion_risk,
    }
}
