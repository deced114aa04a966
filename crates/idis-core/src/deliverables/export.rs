// idis-core/src/deliverables/export.rs
// ============================================================================
// Module: IDIS Deliverable Export
// Description: Validated, reproducible PDF and DOCX export.
// Purpose: Run the No-Free-Facts gate, then render deterministically.
// Dependencies: crate::{core, validators, deliverables}
// ============================================================================

//! ## Overview
//! Export runs the No-Free-Facts gate before any rendering: a single factual
//! statement without a claim or calc reference fails the whole export with
//! the aggregated violation list. Rendering goes through the canonical block
//! representation into the deterministic writers, so for identical inputs
//! and export timestamps the output hashes are invariant across processes
//! and platforms.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_bytes;
use crate::core::time::Timestamp;
use crate::deliverables::docx::write_docx;
use crate::deliverables::model::Deliverable;
use crate::deliverables::pdf::write_pdf;
use crate::deliverables::render::render_blocks;
use crate::validators::ValidationIssue;
use crate::validators::no_free_facts::validate_no_free_facts;

// ============================================================================
// SECTION: Export Types
// ============================================================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    /// PDF 1.4 artifact.
    Pdf,
    /// DOCX (OPC zip) artifact.
    Docx,
}

/// A rendered export artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Artifact format.
    pub format: ExportFormat,
    /// Artifact bytes.
    pub content_bytes: Vec<u8>,
    /// Byte length of the artifact.
    pub content_length: usize,
    /// SHA-256 of the artifact bytes.
    pub content_sha256: HashDigest,
    /// True when the audit appendix was rendered.
    pub includes_audit_appendix: bool,
}

/// Export failures.
#[derive(Debug, Error)]
pub enum DeliverableExportError {
    /// The deliverable failed validation before rendering.
    #[error("deliverable validation failed with {} violation(s)", violations.len())]
    ValidationFailed {
        /// Aggregated validation findings.
        violations: Vec<ValidationIssue>,
    },
    /// The export timestamp is unparsable.
    #[error("invalid export timestamp: {0}")]
    InvalidTimestamp(String),
}

// ============================================================================
// SECTION: Export
// ============================================================================

/// Validates and renders a deliverable to PDF.
///
/// # Errors
///
/// Returns [`DeliverableExportError::ValidationFailed`] when the
/// No-Free-Facts gate rejects the deliverable.
pub fn export_to_pdf(
    deliverable: &Deliverable,
    export_timestamp: &str,
    include_audit_appendix: bool,
) -> Result<ExportResult, DeliverableExportError> {
    let timestamp = parse_timestamp(export_timestamp)?;
    enforce_no_free_facts(deliverable)?;
    let blocks = render_blocks(deliverable, include_audit_appendix);
    let content_bytes = write_pdf(&blocks, timestamp);
    Ok(finish(ExportFormat::Pdf, content_bytes, include_audit_appendix))
}

/// Validates and renders a deliverable to DOCX.
///
/// # Errors
///
/// Returns [`DeliverableExportError::ValidationFailed`] when the
/// No-Free-Facts gate rejects the deliverable.
pub fn export_to_docx(
    deliverable: &Deliverable,
    export_timestamp: &str,
    include_audit_appendix: bool,
) -> Result<ExportResult, DeliverableExportError> {
    parse_timestamp(export_timestamp)?;
    enforce_no_free_facts(deliverable)?;
    let blocks = render_blocks(deliverable, include_audit_appendix);
    let content_bytes = write_docx(&blocks);
    Ok(finish(ExportFormat::Docx, content_bytes, include_audit_appendix))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses the caller-supplied export timestamp.
fn parse_timestamp(export_timestamp: &str) -> Result<Timestamp, DeliverableExportError> {
    Timestamp::parse(export_timestamp)
        .ok_or_else(|| DeliverableExportError::InvalidTimestamp(export_timestamp.to_string()))
}

/// Runs the No-Free-Facts gate; violations abort the export.
fn enforce_no_free_facts(deliverable: &Deliverable) -> Result<(), DeliverableExportError> {
    let result = validate_no_free_facts(deliverable);
    if result.passed {
        Ok(())
    } else {
        Err(DeliverableExportError::ValidationFailed {
            violations: result.errors,
        })
    }
}

/// Assembles the export result with its content hash.
fn finish(
    format: ExportFormat,
    content_bytes: Vec<u8>,
    includes_audit_appendix: bool,
) -> ExportResult {
    let content_sha256 = hash_bytes(&content_bytes);
    ExportResult {
        format,
        content_length: content_bytes.len(),
        content_sha256,
        content_bytes,
        includes_audit_appendix,
    }
}
