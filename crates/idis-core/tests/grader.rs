// idis-core/tests/grader.rs
// ============================================================================
// Module: Sanad Grader Tests
// Description: Tier, defect, cap, and upgrade behavior of the grader.
// ============================================================================
//! ## Overview
//! Validates deterministic grade combination: tier-derived base grades,
//! FATAL defects forcing D, MAJOR downgrades, the MUTAWATIR upgrade, the
//! admissibility cap, and COI handling.

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

use idis_core::core::claim::Claim;
use idis_core::core::claim::ClaimAction;
use idis_core::core::claim::ClaimClass;
use idis_core::core::claim::ClaimVerdict;
use idis_core::core::claim::Grade;
use idis_core::core::claim::Materiality;
use idis_core::core::decimal::Dec;
use idis_core::core::evidence::CoiDisclosure;
use idis_core::core::evidence::EvidenceItem;
use idis_core::core::evidence::SourceType;
use idis_core::core::evidence::VerificationStatus;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::EvidenceId;
use idis_core::core::identifiers::NodeId;
use idis_core::core::identifiers::SanadId;
use idis_core::core::identifiers::SpanId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::sanad::CorroborationLevel;
use idis_core::core::sanad::Sanad;
use idis_core::core::sanad::TransmissionNode;
use idis_core::core::sanad::TransmissionKind;
use idis_core::core::time::Timestamp;
use idis_core::runtime::grader::GraderInput;
use idis_core::runtime::grader::grade_sanad;
use idis_core::runtime::grader::tiers::SourceTier;
use idis_core::runtime::grader::tiers::assign_source_tier;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Pinned timestamp.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// Builds an evidence item of the given source type.
fn evidence(id: &str, source_type: SourceType, cluster: Option<&str>) -> EvidenceItem {
    EvidenceItem {
        evidence_id: EvidenceId::new(id),
        tenant_id: TenantId::new("t-1"),
        source_span_id: SpanId::new("span-1"),
        source_type,
        source_grade: Grade::B,
        source_system: "ingest".to_string(),
        upstream_origin_id: None,
        independence_cluster: cluster.map(str::to_string),
        coi: None,
        observed_value: None,
        verification_status: VerificationStatus::Pending,
        captured_at: now(),
    }
}

/// Builds a two-node healthy chain rooted in the given evidence.
fn healthy_sanad(primary: &EvidenceItem) -> Sanad {
    Sanad {
        sanad_id: SanadId::new("s-1"),
        tenant_id: TenantId::new("t-1"),
        claim_id: ClaimId::new("c-1"),
        primary_evidence_id: Some(primary.evidence_id.clone()),
        transmission_chain: vec![
            TransmissionNode {
                node_id: NodeId::new("n-1"),
                kind: TransmissionKind::Extraction,
                parent_id: None,
                timestamp: Timestamp::parse("2026-01-10T10:00:00Z"),
                upstream_origin_id: Some("origin-1".to_string()),
                evidence_id: Some(primary.evidence_id.clone()),
                input_refs: Vec::new(),
                output_refs: vec!["c-1".to_string()],
            },
            TransmissionNode {
                node_id: NodeId::new("n-2"),
                kind: TransmissionKind::HumanVerification,
                parent_id: Some(NodeId::new("n-1")),
                timestamp: Timestamp::parse("2026-01-10T11:00:00Z"),
                upstream_origin_id: Some("origin-1".to_string()),
                evidence_id: None,
                input_refs: vec!["c-1".to_string()],
                output_refs: vec!["c-1".to_string()],
            },
        ],
        grade: Grade::D,
        corroboration_level: CorroborationLevel::None,
        independent_chain_count: 0,
        grade_rationale: String::new(),
        created_at: now(),
        updated_at: now(),
    }
}

/// Builds a claim of the given materiality with a strong dhabt score.
fn claim(materiality: Materiality) -> Claim {
    Claim {
        claim_id: ClaimId::new("c-1"),
        tenant_id: TenantId::new("t-1"),
        deal_id: DealId::new("d-1"),
        claim_class: ClaimClass::Financial,
        text: "Revenue was $5M.".to_string(),
        value: None,
        claim_grade: Grade::D,
        claim_verdict: ClaimVerdict::Unverified,
        claim_action: ClaimAction::Verify,
        materiality,
        primary_span_id: SpanId::new("span-1"),
        cited_document: None,
        extraction_confidence: Some(Dec::parse("0.97").unwrap()),
        dhabt_score: Some(Dec::parse("0.95").unwrap()),
        is_factual: true,
        is_subjective: false,
        evidence_ids: vec![EvidenceId::new("e-1")],
        calc_ids: Vec::new(),
        created_at: now(),
        updated_at: now(),
    }
}

// ============================================================================
// SECTION: Tier Assignment
// ============================================================================

/// Tests the tier ladder over representative source types.
#[test]
fn test_tier_assignment_and_base_grades() {
    let audited = evidence("e-1", SourceType::AuditedFinancials, None);
    assert_eq!(assign_source_tier(Some(&audited)), SourceTier::T1);
    assert_eq!(SourceTier::T1.base_grade(), Grade::A);

    let data_room = evidence("e-2", SourceType::DataRoomDocument, None);
    assert_eq!(assign_source_tier(Some(&data_room)), SourceTier::T2);

    let press = evidence("e-3", SourceType::PressArticle, None);
    assert_eq!(assign_source_tier(Some(&press)), SourceTier::T4);
    assert_eq!(SourceTier::T4.base_grade(), Grade::C);

    // Missing primary source fails closed to T5.
    assert_eq!(assign_source_tier(None), SourceTier::T5);
    assert_eq!(SourceTier::T5.base_grade(), Grade::D);
}

// ============================================================================
// SECTION: Grade Combination
// ============================================================================

/// Tests a healthy T1-rooted chain grades A.
#[test]
fn test_healthy_t1_chain_grades_a() {
    let primary = evidence("e-1", SourceType::AuditedFinancials, Some("cluster-a"));
    let sanad = healthy_sanad(&primary);
    let sources = vec![primary];
    let claim = claim(Materiality::Medium);

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: Some(&claim),
        documents: &[],
        known_evidence_ids: None,
    });
    assert_eq!(result.grade, Grade::A);
    assert!(result.explanation.fatal_defects.is_empty());
    assert_eq!(result.explanation.final_grade, Grade::A);
}

/// Tests an empty transmission chain is a FATAL break forcing D.
#[test]
fn test_empty_chain_forces_d() {
    let primary = evidence("e-1", SourceType::AuditedFinancials, None);
    let mut sanad = healthy_sanad(&primary);
    sanad.transmission_chain.clear();
    let sources = vec![primary];

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    assert_eq!(result.grade, Grade::D);
    assert_eq!(result.explanation.fatal_defects.len(), 1);
    assert_eq!(result.explanation.fatal_defects[0].code, "ILAL_CHAIN_BREAK");
}

/// Tests MUTAWATIR corroboration upgrades one grade when no MAJOR defects.
#[test]
fn test_mutawatir_upgrade() {
    let primary = evidence("e-1", SourceType::DataRoomDocument, Some("cluster-a"));
    let sanad = healthy_sanad(&primary);
    let sources = vec![
        primary,
        evidence("e-2", SourceType::ThirdPartyDatabase, Some("cluster-b")),
        evidence("e-3", SourceType::IndustryReport, Some("cluster-c")),
    ];

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    // Base B from T2, upgraded to A by three independent clusters.
    assert_eq!(result.tawatur.status, CorroborationLevel::Mutawatir);
    assert_eq!(result.tawatur.independent_count, 3);
    assert_eq!(result.grade, Grade::A);
    assert_eq!(result.explanation.upgrades_applied.len(), 1);
}

/// Tests sources sharing a cluster corroborate as one chain.
#[test]
fn test_shared_cluster_counts_once() {
    let primary = evidence("e-1", SourceType::DataRoomDocument, Some("cluster-a"));
    let sanad = healthy_sanad(&primary);
    let sources = vec![
        primary,
        evidence("e-2", SourceType::PressArticle, Some("cluster-a")),
        evidence("e-3", SourceType::PressArticle, Some("cluster-a")),
    ];

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    assert_eq!(result.tawatur.independent_count, 1);
    assert_eq!(result.tawatur.status, CorroborationLevel::Ahad1);
}

/// Tests the admissibility cap: CRITICAL claim on a T4 source caps at C.
#[test]
fn test_admissibility_cap_for_critical_materiality() {
    let primary = evidence("e-1", SourceType::PressArticle, Some("cluster-a"));
    let sanad = healthy_sanad(&primary);
    let sources = vec![
        primary,
        evidence("e-2", SourceType::ThirdPartyDatabase, Some("cluster-b")),
        evidence("e-3", SourceType::IndustryReport, Some("cluster-c")),
    ];
    let claim = claim(Materiality::Critical);

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: Some(&claim),
        documents: &[],
        known_evidence_ids: None,
    });
    // MUTAWATIR would upgrade C to B, but the admissibility cap holds at C.
    assert_eq!(result.grade, Grade::C);
    assert!(result.explanation.grade_caps.contains(&Grade::C));
}

// ============================================================================
// SECTION: COI
// ============================================================================

/// Tests a disclosed self-serving source caps the grade at C.
#[test]
fn test_disclosed_coi_caps_at_c() {
    let mut primary = evidence("e-1", SourceType::AuditedFinancials, Some("cluster-a"));
    primary.coi = Some(CoiDisclosure {
        self_serving: true,
        disclosed: true,
    });
    let sanad = healthy_sanad(&primary);
    let sources = vec![primary];

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    assert_eq!(result.grade, Grade::C);
}

/// Tests an undisclosed self-serving source raises a MAJOR defect.
#[test]
fn test_undisclosed_coi_is_major_defect() {
    let mut primary = evidence("e-1", SourceType::AuditedFinancials, Some("cluster-a"));
    primary.coi = Some(CoiDisclosure {
        self_serving: true,
        disclosed: false,
    });
    let sanad = healthy_sanad(&primary);
    let sources = vec![primary];

    let result = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &sources,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    // Base A downgraded once by the MAJOR COI defect.
    assert_eq!(result.grade, Grade::B);
    assert_eq!(result.explanation.major_defects.len(), 1);
    assert_eq!(result.explanation.major_defects[0].code, "COI_UNDISCLOSED");
}

// ============================================================================
// SECTION: Determinism
// ============================================================================

/// Tests grading is invariant to source ordering.
#[test]
fn test_grading_invariant_to_source_order() {
    let primary = evidence("e-1", SourceType::DataRoomDocument, Some("cluster-a"));
    let second = evidence("e-2", SourceType::ThirdPartyDatabase, Some("cluster-b"));
    let third = evidence("e-3", SourceType::IndustryReport, Some("cluster-c"));
    let sanad = healthy_sanad(&primary);

    let forward = vec![primary.clone(), second.clone(), third.clone()];
    let backward = vec![third, second, primary];

    let result_forward = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &forward,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    let result_backward = grade_sanad(&GraderInput {
        sanad: &sanad,
        sources: &backward,
        claim: None,
        documents: &[],
        known_evidence_ids: None,
    });
    assert_eq!(result_forward.grade, result_backward.grade);
    assert_eq!(result_forward.explanation, result_backward.explanation);
}
