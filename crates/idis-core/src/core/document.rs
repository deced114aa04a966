// idis-core/src/core/document.rs
// ============================================================================
// Module: IDIS Document Model
// Description: Ingested artifacts and their addressable content spans.
// Purpose: Anchor every extracted claim to a verifiable source locator.
// Dependencies: serde, crate::core::{hashing, identifiers}
// ============================================================================

//! ## Overview
//! Documents are ingested deal artifacts (PDF, XLSX, DOCX, PPTX). A [`Span`]
//! is the minimal addressable locator of content inside a document; each span
//! carries a content SHA-256 so downstream provenance checks can detect
//! drifted or tampered excerpts. Concrete parsers live outside the core; the
//! model only fixes the locator vocabulary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::claim::ClaimClass;
use crate::core::hashing::HashDigest;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::SpanId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Document Enums
// ============================================================================

/// Source artifact formats accepted by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Portable document format.
    Pdf,
    /// Spreadsheet workbook.
    Xlsx,
    /// Word-processing document.
    Docx,
    /// Presentation deck.
    Pptx,
}

/// Span content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanType {
    /// Running page text.
    PageText,
    /// A spreadsheet cell.
    Cell,
    /// A paragraph.
    Paragraph,
    /// A slide shape.
    Shape,
    /// A table region.
    Table,
}

// ============================================================================
// SECTION: Span Locators
// ============================================================================

/// Minimal addressable locator of content within a document.
///
/// # Invariants
/// - The variant must agree with the parent document's [`DocumentType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanLocator {
    /// PDF locator.
    Pdf {
        /// 1-based page number.
        page: u32,
        /// 1-based line number on the page.
        line: u32,
    },
    /// Spreadsheet cell locator.
    Xlsx {
        /// Sheet name.
        sheet: String,
        /// A1-style cell reference.
        cell: String,
        /// 1-based row index.
        row: u32,
        /// 1-based column index.
        col: u32,
    },
    /// Word-processing locator.
    Docx {
        /// 1-based paragraph index.
        paragraph: u32,
    },
    /// Presentation locator.
    Pptx {
        /// 1-based slide number.
        slide: u32,
        /// 1-based shape index on the slide.
        shape: u32,
        /// 1-based paragraph index within the shape.
        paragraph: u32,
    },
}

// ============================================================================
// SECTION: Span Record
// ============================================================================

/// An addressable excerpt of an ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Span identifier.
    pub span_id: SpanId,
    /// Parent document.
    pub document_id: DocumentId,
    /// Span content kind.
    pub span_type: SpanType,
    /// Locator within the document.
    pub locator: SpanLocator,
    /// Excerpted text.
    pub text_excerpt: String,
    /// SHA-256 of the excerpt content.
    pub content_sha256: HashDigest,
}

// ============================================================================
// SECTION: Document Record
// ============================================================================

/// Reference from a claim to the document (version) it cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Cited document identifier.
    pub document_id: DocumentId,
    /// Cited version, when the claim pins one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Cited content hash, when the claim pins one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<HashDigest>,
}

/// An ingested deal artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub document_id: DocumentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Artifact format.
    pub doc_type: DocumentType,
    /// Original file name.
    pub document_name: String,
    /// Monotonic version of this ingestion.
    pub version: u32,
    /// SHA-256 of the raw artifact bytes.
    pub sha256: HashDigest,
    /// Ingestion timestamp.
    pub ingested_at: Timestamp,
    /// Extracted spans.
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Normalized metric values by claim class, used for version-drift checks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_values: BTreeMap<ClaimClass, String>,
}
