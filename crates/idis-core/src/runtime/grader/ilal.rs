// idis-core/src/runtime/grader/ilal.rs
// ============================================================================
// Module: IDIS I'lal Detection
// Description: Hidden-defect detection over transmission chains.
// Purpose: Find chain breaks, grafting, impossible chronology, version drift.
// Dependencies: crate::core::{claim, defect, document, sanad}
// ============================================================================

//! ## Overview
//! I'lal are hidden defects in an evidence chain. Detection is deterministic
//! and fail-closed: an empty chain is a FATAL break, a node referencing a
//! missing parent or unknown evidence is a FATAL break, conflicting upstream
//! origins between parent and child are FATAL grafting, and a child
//! timestamped before its parent is a FATAL chronology violation. A claim
//! citing an older document version whose metric changed is MAJOR version
//! drift. Nodes are examined in `node_id` order so results never depend on
//! input ordering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::Claim;
use crate::core::defect::CureProtocol;
use crate::core::defect::DefectSeverity;
use crate::core::document::Document;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::NodeId;
use crate::core::sanad::Sanad;
use crate::core::sanad::TransmissionNode;

// ============================================================================
// SECTION: Defect Model
// ============================================================================

/// I'lal defect codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IlalCode {
    /// Broken transmission chain.
    #[serde(rename = "ILAL_CHAIN_BREAK")]
    ChainBreak,
    /// Inconsistent provenance linkage.
    #[serde(rename = "ILAL_CHAIN_GRAFTING")]
    ChainGrafting,
    /// Timestamps violate causality.
    #[serde(rename = "ILAL_CHRONOLOGY_IMPOSSIBLE")]
    ChronologyImpossible,
    /// Claim cites a superseded document version.
    #[serde(rename = "ILAL_VERSION_DRIFT")]
    VersionDrift,
}

impl IlalCode {
    /// Returns the stable defect code string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChainBreak => "ILAL_CHAIN_BREAK",
            Self::ChainGrafting => "ILAL_CHAIN_GRAFTING",
            Self::ChronologyImpossible => "ILAL_CHRONOLOGY_IMPOSSIBLE",
            Self::VersionDrift => "ILAL_VERSION_DRIFT",
        }
    }
}

/// A detected hidden defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlalDefect {
    /// Defect code.
    pub code: IlalCode,
    /// Severity of the finding.
    pub severity: DefectSeverity,
    /// Human-readable description.
    pub description: String,
    /// Remediation protocol.
    pub cure_protocol: CureProtocol,
    /// Structured metadata for the finding.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Chain Helpers
// ============================================================================

/// Returns chain nodes sorted by node id for deterministic iteration.
fn sorted_nodes(sanad: &Sanad) -> Vec<&TransmissionNode> {
    let mut nodes: Vec<&TransmissionNode> = sanad.transmission_chain.iter().collect();
    nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    nodes
}

/// Builds the node-by-id lookup map.
fn node_index(sanad: &Sanad) -> BTreeMap<&NodeId, &TransmissionNode> {
    sanad.transmission_chain.iter().map(|node| (&node.node_id, node)).collect()
}

// ============================================================================
// SECTION: Chain Break
// ============================================================================

/// Detects broken transmission chains.
#[must_use]
pub fn detect_chain_break(
    sanad: &Sanad,
    known_evidence_ids: Option<&BTreeSet<EvidenceId>>,
) -> Option<IlalDefect> {
    if sanad.transmission_chain.is_empty() {
        return Some(IlalDefect {
            code: IlalCode::ChainBreak,
            severity: DefectSeverity::Fatal,
            description: "Transmission chain is empty".to_string(),
            cure_protocol: CureProtocol::ReconstructChain,
            metadata: BTreeMap::new(),
        });
    }

    let index = node_index(sanad);
    let nodes = sorted_nodes(sanad);

    for node in &nodes {
        if let Some(parent_id) = &node.parent_id
            && !index.contains_key(parent_id)
        {
            return Some(IlalDefect {
                code: IlalCode::ChainBreak,
                severity: DefectSeverity::Fatal,
                description: format!(
                    "Node {} references non-existent parent {parent_id}",
                    node.node_id
                ),
                cure_protocol: CureProtocol::ReconstructChain,
                metadata: BTreeMap::from([
                    ("node_id".to_string(), node.node_id.to_string()),
                    ("missing_parent_id".to_string(), parent_id.to_string()),
                ]),
            });
        }
        if let (Some(evidence_id), Some(known)) = (&node.evidence_id, known_evidence_ids)
            && !known.contains(evidence_id)
        {
            return Some(IlalDefect {
                code: IlalCode::ChainBreak,
                severity: DefectSeverity::Fatal,
                description: format!(
                    "Node {} references non-existent evidence {evidence_id}",
                    node.node_id
                ),
                cure_protocol: CureProtocol::RequestSource,
                metadata: BTreeMap::from([
                    ("node_id".to_string(), node.node_id.to_string()),
                    ("missing_evidence_id".to_string(), evidence_id.to_string()),
                ]),
            });
        }
    }

    let roots: Vec<&NodeId> = nodes
        .iter()
        .filter(|node| node.parent_id.is_none())
        .map(|node| &node.node_id)
        .collect();

    if roots.is_empty() {
        return Some(IlalDefect {
            code: IlalCode::ChainBreak,
            severity: DefectSeverity::Fatal,
            description: "Transmission chain has no root node (all nodes have parents)"
                .to_string(),
            cure_protocol: CureProtocol::ReconstructChain,
            metadata: BTreeMap::new(),
        });
    }

    if roots.len() == 1 {
        let mut children: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
        for node in &nodes {
            if let Some(parent_id) = &node.parent_id {
                children.entry(parent_id).or_default().push(&node.node_id);
            }
        }
        let mut reachable: BTreeSet<&NodeId> = BTreeSet::new();
        let mut pending = vec![roots[0]];
        while let Some(current) = pending.pop() {
            if !reachable.insert(current) {
                continue;
            }
            if let Some(next) = children.get(current) {
                pending.extend(next.iter());
            }
        }
        let orphaned: Vec<String> = nodes
            .iter()
            .filter(|node| !reachable.contains(&node.node_id))
            .map(|node| node.node_id.to_string())
            .collect();
        if !orphaned.is_empty() {
            return Some(IlalDefect {
                code: IlalCode::ChainBreak,
                severity: DefectSeverity::Fatal,
                description: format!(
                    "Orphaned nodes not connected to root: {}",
                    orphaned.join(", ")
                ),
                cure_protocol: CureProtocol::ReconstructChain,
                metadata: BTreeMap::from([(
                    "orphaned_nodes".to_string(),
                    orphaned.join(","),
                )]),
            });
        }
    }

    None
}

// ============================================================================
// SECTION: Chain Grafting
// ============================================================================

/// Detects inconsistent provenance linkage between parent and child.
#[must_use]
pub fn detect_chain_grafting(sanad: &Sanad) -> Option<IlalDefect> {
    if sanad.transmission_chain.len() < 2 {
        return None;
    }
    let index = node_index(sanad);
    for node in sorted_nodes(sanad) {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        let Some(parent) = index.get(parent_id) else {
            continue;
        };
        if let (Some(node_origin), Some(parent_origin)) =
            (&node.upstream_origin_id, &parent.upstream_origin_id)
            && node_origin != parent_origin
        {
            return Some(IlalDefect {
                code: IlalCode::ChainGrafting,
                severity: DefectSeverity::Fatal,
                description: format!(
                    "Inconsistent provenance: node {} claims origin {node_origin} but parent \
                     suggests {parent_origin}",
                    node.node_id
                ),
                cure_protocol: CureProtocol::HumanArbitration,
                metadata: BTreeMap::from([
                    ("node_id".to_string(), node.node_id.to_string()),
                    ("node_origin".to_string(), node_origin.clone()),
                    ("parent_id".to_string(), parent_id.to_string()),
                    ("parent_origin".to_string(), parent_origin.clone()),
                ]),
            });
        }
    }
    None
}

// ============================================================================
// SECTION: Chronology
// ============================================================================

/// Detects children timestamped before their parents.
///
/// Nodes without a parseable timestamp are skipped for this check; chain
/// break rules still apply to them.
#[must_use]
pub fn detect_chronology_impossible(sanad: &Sanad) -> Option<IlalDefect> {
    if sanad.transmission_chain.len() < 2 {
        return None;
    }
    let index = node_index(sanad);
    for node in sorted_nodes(sanad) {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        let Some(parent) = index.get(parent_id) else {
            continue;
        };
        if let (Some(node_ts), Some(parent_ts)) = (&node.timestamp, &parent.timestamp)
            && node_ts < parent_ts
        {
            return Some(IlalDefect {
                code: IlalCode::ChronologyImpossible,
                severity: DefectSeverity::Fatal,
                description: format!(
                    "Chronology violation: node {} ({node_ts}) precedes parent {parent_id} \
                     ({parent_ts})",
                    node.node_id
                ),
                cure_protocol: CureProtocol::RequireReaudit,
                metadata: BTreeMap::from([
                    ("node_id".to_string(), node.node_id.to_string()),
                    ("node_timestamp".to_string(), node_ts.to_string()),
                    ("parent_id".to_string(), parent_id.to_string()),
                    ("parent_timestamp".to_string(), parent_ts.to_string()),
                ]),
            });
        }
    }
    None
}

// ============================================================================
// SECTION: Version Drift
// ============================================================================

/// Detects claims citing a superseded document version with a changed metric.
#[must_use]
pub fn detect_version_drift(claim: &Claim, documents: &[Document]) -> Option<IlalDefect> {
    let cited = claim.cited_document.as_ref()?;

    let mut matching: Vec<&Document> = documents
        .iter()
        .filter(|document| document.document_id == cited.document_id)
        .collect();
    if matching.len() < 2 {
        return None;
    }
    matching.sort_by_key(|document| document.version);

    let cited_doc = cited
        .version
        .and_then(|version| matching.iter().find(|document| document.version == version))
        .or_else(|| {
            cited.sha256.as_ref().and_then(|sha| {
                matching.iter().find(|document| &document.sha256 == sha)
            })
        })
        .copied()
        .or_else(|| matching.first().copied())?;

    let latest = matching.last().copied()?;
    if latest.version <= cited_doc.version {
        return None;
    }

    let cited_value = cited_doc.metric_values.get(&claim.claim_class);
    let latest_value = latest.metric_values.get(&claim.claim_class);
    if cited_value.is_none() && latest_value.is_none() {
        return None;
    }
    if cited_value == latest_value {
        return None;
    }

    Some(IlalDefect {
        code: IlalCode::VersionDrift,
        severity: DefectSeverity::Major,
        description: format!(
            "Claim cites version {} (value: {}) but version {} exists with updated value: {}",
            cited_doc.version,
            cited_value.map_or("-", String::as_str),
            latest.version,
            latest_value.map_or("-", String::as_str),
        ),
        cure_protocol: CureProtocol::RequireReaudit,
        metadata: BTreeMap::from([
            ("cited_version".to_string(), cited_doc.version.to_string()),
            ("latest_version".to_string(), latest.version.to_string()),
            ("document_id".to_string(), cited.document_id.to_string()),
        ]),
    })
}

// ============================================================================
// SECTION: Combined Detection
// ============================================================================

/// Runs every I'lal check in a fixed order.
#[must_use]
pub fn detect_all_ilal(
    sanad: &Sanad,
    claim: Option<&Claim>,
    documents: &[Document],
    known_evidence_ids: Option<&BTreeSet<EvidenceId>>,
) -> Vec<IlalDefect> {
    let mut defects = Vec::new();
    if let Some(defect) = detect_chain_break(sanad, known_evidence_ids) {
        defects.push(defect);
    }
    if let Some(defect) = detect_chain_grafting(sanad) {
        defects.push(defect);
    }
    if let Some(defect) = detect_chronology_impossible(sanad) {
        defects.push(defect);
    }
    if let Some(claim) = claim
        && !documents.is_empty()
        && let Some(defect) = detect_version_drift(claim, documents)
    {
        defects.push(defect);
    }
    defects
}
