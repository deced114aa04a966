// idis-core/tests/ilal_shudhudh.rs
// ============================================================================
// Module: I'lal and Shudhudh Tests
// Description: Hidden-defect detection and reconciliation-first anomalies.
// ============================================================================
//! ## Overview
//! Validates chain-break, grafting, chronology, and version-drift detection,
//! and the reconciliation-before-anomaly behavior of Shudhudh.

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
use std::collections::BTreeSet;

use idis_core::core::claim::Claim;
use idis_core::core::claim::ClaimAction;
use idis_core::core::claim::ClaimClass;
use idis_core::core::claim::ClaimVerdict;
use idis_core::core::claim::Grade;
use idis_core::core::claim::Materiality;
use idis_core::core::defect::DefectSeverity;
use idis_core::core::document::Document;
use idis_core::core::document::DocumentRef;
use idis_core::core::document::DocumentType;
use idis_core::core::evidence::EvidenceItem;
use idis_core::core::evidence::SourceType;
use idis_core::core::evidence::VerificationStatus;
use idis_core::core::hashing::hash_bytes;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::DocumentId;
use idis_core::core::identifiers::EvidenceId;
use idis_core::core::identifiers::NodeId;
use idis_core::core::identifiers::SanadId;
use idis_core::core::identifiers::SpanId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::sanad::CorroborationLevel;
use idis_core::core::sanad::Sanad;
use idis_core::core::sanad::TransmissionKind;
use idis_core::core::sanad::TransmissionNode;
use idis_core::core::time::Timestamp;
use idis_core::runtime::grader::ilal::IlalCode;
use idis_core::runtime::grader::ilal::detect_all_ilal;
use idis_core::runtime::grader::ilal::detect_chain_break;
use idis_core::runtime::grader::ilal::detect_chain_grafting;
use idis_core::runtime::grader::ilal::detect_chronology_impossible;
use idis_core::runtime::grader::shudhudh::ObservedValue;
use idis_core::runtime::grader::shudhudh::detect_shudhudh;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Pinned timestamp.
fn now() -> Timestamp {
    Timestamp::parse("2026-01-11T12:00:00Z").unwrap()
}

/// Chain node with the given identity and linkage.
fn node(id: &str, parent: Option<&str>, timestamp: &str, origin: &str) -> TransmissionNode {
    TransmissionNode {
        node_id: NodeId::new(id),
        kind: TransmissionKind::Extraction,
        parent_id: parent.map(NodeId::new),
        timestamp: Timestamp::parse(timestamp),
        upstream_origin_id: Some(origin.to_string()),
        evidence_id: None,
        input_refs: Vec::new(),
        output_refs: Vec::new(),
    }
}

/// Sanad over the given chain.
fn sanad(chain: Vec<TransmissionNode>) -> Sanad {
    Sanad {
        sanad_id: SanadId::new("s-1"),
        tenant_id: TenantId::new("t-1"),
        claim_id: ClaimId::new("c-1"),
        primary_evidence_id: None,
        transmission_chain: chain,
        grade: Grade::D,
        corroboration_level: CorroborationLevel::None,
        independent_chain_count: 0,
        grade_rationale: String::new(),
        created_at: now(),
        updated_at: now(),
    }
}

/// Evidence item with an observed value for anomaly tests.
fn source(id: &str, source_type: SourceType, observed: &str) -> EvidenceItem {
    EvidenceItem {
        evidence_id: EvidenceId::new(id),
        tenant_id: TenantId::new("t-1"),
        source_span_id: SpanId::new("span-1"),
        source_type,
        source_grade: Grade::B,
        source_system: "ingest".to_string(),
        upstream_origin_id: None,
        independence_cluster: Some(id.to_string()),
        coi: None,
        observed_value: Some(observed.to_string()),
        verification_status: VerificationStatus::Pending,
        captured_at: now(),
    }
}

// ============================================================================
// SECTION: Chain Break
// ============================================================================

/// Tests a missing parent reference is a FATAL break.
#[test]
fn test_missing_parent_is_fatal_break() {
    let chain = vec![
        node("n-1", None, "2026-01-10T10:00:00Z", "origin-1"),
        node("n-2", Some("n-ghost"), "2026-01-10T11:00:00Z", "origin-1"),
    ];
    let defect = detect_chain_break(&sanad(chain), None).unwrap();
    assert_eq!(defect.code, IlalCode::ChainBreak);
    assert_eq!(defect.severity, DefectSeverity::Fatal);
}

/// Tests a node referencing unknown evidence is a FATAL break.
#[test]
fn test_unknown_evidence_reference_is_fatal_break() {
    let mut broken = node("n-1", None, "2026-01-10T10:00:00Z", "origin-1");
    broken.evidence_id = Some(EvidenceId::new("e-ghost"));
    let known: BTreeSet<EvidenceId> = BTreeSet::from([EvidenceId::new("e-1")]);
    let defect = detect_chain_break(&sanad(vec![broken]), Some(&known)).unwrap();
    assert_eq!(defect.code, IlalCode::ChainBreak);
}

/// Tests orphaned nodes unreachable from the single root are FATAL.
#[test]
fn test_orphan_nodes_are_fatal_break() {
    let chain = vec![
        node("n-1", None, "2026-01-10T10:00:00Z", "origin-1"),
        node("n-2", Some("n-1"), "2026-01-10T11:00:00Z", "origin-1"),
        // n-3 and n-4 form a disconnected cycle-free island.
        node("n-3", Some("n-4"), "2026-01-10T11:00:00Z", "origin-1"),
        node("n-4", Some("n-3"), "2026-01-10T12:00:00Z", "origin-1"),
    ];
    let defect = detect_chain_break(&sanad(chain), None).unwrap();
    assert_eq!(defect.code, IlalCode::ChainBreak);
    assert!(defect.description.contains("Orphaned"));
}

/// Tests a healthy chain produces no break.
#[test]
fn test_healthy_chain_no_break() {
    let chain = vec![
        node("n-1", None, "2026-01-10T10:00:00Z", "origin-1"),
        node("n-2", Some("n-1"), "2026-01-10T11:00:00Z", "origin-1"),
    ];
    assert!(detect_chain_break(&sanad(chain), None).is_none());
}

// ============================================================================
// SECTION: Grafting and Chronology
// ============================================================================

/// Tests conflicting upstream origins between parent and child are FATAL.
#[test]
fn test_grafting_detected() {
    let chain = vec![
        node("n-1", None, "2026-01-10T10:00:00Z", "origin-1"),
        node("n-2", Some("n-1"), "2026-01-10T11:00:00Z", "origin-2"),
    ];
    let defect = detect_chain_grafting(&sanad(chain)).unwrap();
    assert_eq!(defect.code, IlalCode::ChainGrafting);
    assert_eq!(defect.severity, DefectSeverity::Fatal);
}

/// Tests a child timestamped before its parent is FATAL.
#[test]
fn test_chronology_violation_detected() {
    let chain = vec![
        node("n-1", None, "2026-01-10T10:00:00Z", "origin-1"),
        node("n-2", Some("n-1"), "2026-01-10T09:00:00Z", "origin-1"),
    ];
    let defect = detect_chronology_impossible(&sanad(chain)).unwrap();
    assert_eq!(defect.code, IlalCode::ChronologyImpossible);
}

/// Tests nodes without timestamps skip the chronology check.
#[test]
fn test_missing_timestamps_skip_chronology() {
    let mut first = node("n-1", None, "2026-01-10T10:00:00Z", "origin-1");
    first.timestamp = None;
    let second = node("n-2", Some("n-1"), "2026-01-10T09:00:00Z", "origin-1");
    assert!(detect_chronology_impossible(&sanad(vec![first, second])).is_none());
}

// ============================================================================
// SECTION: Version Drift
// ============================================================================

/// Builds a document version with a FINANCIAL metric value.
fn document(version: u32, metric: &str) -> Document {
    Document {
        document_id: DocumentId::new("doc-1"),
        tenant_id: TenantId::new("t-1"),
        doc_type: DocumentType::Pdf,
        document_name: "financials.pdf".to_string(),
        version,
        sha256: hash_bytes(format!("doc-1-v{version}").as_bytes()),
        ingested_at: now(),
        spans: Vec::new(),
        metric_values: BTreeMap::from([(ClaimClass::Financial, metric.to_string())]),
    }
}

/// Tests a claim citing an old version with a changed metric is MAJOR drift.
#[test]
fn test_version_drift_detected() {
    let claim = Claim {
        claim_id: ClaimId::new("c-1"),
        tenant_id: TenantId::new("t-1"),
        deal_id: DealId::new("d-1"),
        claim_class: ClaimClass::Financial,
        text: "Revenue was $5M.".to_string(),
        value: None,
        claim_grade: Grade::D,
        claim_verdict: ClaimVerdict::Unverified,
        claim_action: ClaimAction::Verify,
        materiality: Materiality::High,
        primary_span_id: SpanId::new("span-1"),
        cited_document: Some(DocumentRef {
            document_id: DocumentId::new("doc-1"),
            version: Some(1),
            sha256: None,
        }),
        extraction_confidence: None,
        dhabt_score: None,
        is_factual: true,
        is_subjective: false,
        evidence_ids: vec![EvidenceId::new("e-1")],
        calc_ids: Vec::new(),
        created_at: now(),
        updated_at: now(),
    };
    let documents = vec![document(1, "5000000"), document(2, "4200000")];
    let chain = vec![node("n-1", None, "2026-01-10T10:00:00Z", "origin-1")];

    let defects = detect_all_ilal(&sanad(chain), Some(&claim), &documents, None);
    assert_eq!(defects.len(), 1);
    assert_eq!(defects[0].code, IlalCode::VersionDrift);
    assert_eq!(defects[0].severity, DefectSeverity::Major);
}

// ============================================================================
// SECTION: Shudhudh
// ============================================================================

/// Tests values within 1% reconcile as rounding, no anomaly.
#[test]
fn test_rounding_reconciliation() {
    let pairs = vec![
        (
            ObservedValue::from_raw("5000000"),
            source("e-1", SourceType::AuditedFinancials, "5000000"),
        ),
        (
            ObservedValue::from_raw("5020000"),
            source("e-2", SourceType::PressArticle, "5020000"),
        ),
    ];
    let result = detect_shudhudh(&pairs);
    assert!(!result.has_anomaly);
    assert!(result.reconciliation_attempts[0].success);
}

/// Tests a labelled ~1000x divergence reconciles as a MINOR unit note.
#[test]
fn test_unit_conversion_reconciliation() {
    let pairs = vec![
        (
            ObservedValue::from_raw("$5M"),
            source("e-1", SourceType::AuditedFinancials, "$5M"),
        ),
        (
            ObservedValue::from_raw("$5000000K"),
            source("e-2", SourceType::PressArticle, "$5000000K"),
        ),
    ];
    let result = detect_shudhudh(&pairs);
    assert!(!result.has_anomaly);
    assert_eq!(result.defect_code.as_deref(), Some("SHUDHUDH_UNIT_MISMATCH"));
    assert_eq!(result.severity, Some(DefectSeverity::Minor));
}

/// Tests differing time-window labels reconcile as incomparable.
#[test]
fn test_time_window_reconciliation() {
    let pairs = vec![
        (
            ObservedValue::from_raw("FY 4000000"),
            source("e-1", SourceType::AuditedFinancials, "FY 4000000"),
        ),
        (
            ObservedValue::from_raw("LTM 5200000"),
            source("e-2", SourceType::PressArticle, "LTM 5200000"),
        ),
    ];
    let result = detect_shudhudh(&pairs);
    assert!(!result.has_anomaly);
    assert_eq!(result.defect_code.as_deref(), Some("SHUDHUDH_TIME_WINDOW"));
}

/// Tests an unreconciled lower-tier contradiction raises a MAJOR anomaly.
#[test]
fn test_unreconciled_lower_tier_contradiction() {
    let pairs = vec![
        (
            ObservedValue::from_raw("5000000"),
            source("e-1", SourceType::AuditedFinancials, "5000000"),
        ),
        (
            ObservedValue::from_raw("5010000"),
            source("e-2", SourceType::BankStatement, "5010000"),
        ),
        (
            ObservedValue::from_raw("9000000"),
            source("e-3", SourceType::PressArticle, "9000000"),
        ),
    ];
    let result = detect_shudhudh(&pairs);
    assert!(result.has_anomaly);
    assert_eq!(result.defect_code.as_deref(), Some("SHUDHUDH_ANOMALY"));
    assert_eq!(result.severity, Some(DefectSeverity::Major));
}

/// Tests a single value never raises an anomaly.
#[test]
fn test_single_value_no_anomaly() {
    let pairs = vec![(
        ObservedValue::from_raw("5000000"),
        source("e-1", SourceType::AuditedFinancials, "5000000"),
    )];
    let result = detect_shudhudh(&pairs);
    assert!(!result.has_anomaly);
    assert!(result.reconciliation_attempts.is_empty());
}
