// idis-core/src/deliverables/pdf.rs
// ============================================================================
// Module: IDIS PDF Writer
// Description: Deterministic single-file PDF emission from text blocks.
// Purpose: Byte-identical PDF output for identical inputs and timestamps.
// Dependencies: crate::{core::time, deliverables::render}
// ============================================================================

//! ## Overview
//! The writer emits a minimal PDF 1.4 document: catalog, page tree, one
//! page, a Helvetica font object, the content stream, and an info dictionary
//! whose creation and modification dates come from the caller-supplied
//! export timestamp. Every byte offset in the xref table is computed from
//! the buffer, so the output is a pure function of the block list and the
//! timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::time::Timestamp;
use crate::deliverables::render::BlockKind;
use crate::deliverables::render::TextBlock;

// ============================================================================
// SECTION: Layout Constants
// ============================================================================

/// Page height in points (US Letter).
const PAGE_HEIGHT: i32 = 792;
/// Left margin in points.
const MARGIN_LEFT: i32 = 72;
/// Vertical advance per line in points.
const LINE_HEIGHT: i32 = 16;

// ============================================================================
// SECTION: Writer
// ============================================================================

/// Writes a deterministic PDF from the canonical block list.
#[must_use]
pub fn write_pdf(blocks: &[TextBlock], export_timestamp: Timestamp) -> Vec<u8> {
    let content = content_stream(blocks);
    let pdf_date = pdf_date(export_timestamp);

    let objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        format!(
            "<< /Producer (IDIS Deliverable Export) /CreationDate ({pdf_date}) \
             /ModDate ({pdf_date}) >>"
        ),
    ];

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

// ============================================================================
// SECTION: Content Stream
// ============================================================================

/// Builds the page content stream from the block list.
fn content_stream(blocks: &[TextBlock]) -> String {
    let mut stream = String::new();
    let mut y = PAGE_HEIGHT - MARGIN_LEFT;
    for block in blocks {
        let size = match block.kind {
            BlockKind::Title => 16,
            BlockKind::Heading => 13,
            BlockKind::Body => 10,
        };
        stream.push_str(&format!(
            "BT /F1 {size} Tf {MARGIN_LEFT} {y} Td ({}) Tj ET\n",
            escape_pdf_text(&block.text)
        ));
        y -= LINE_HEIGHT;
    }
    stream
}

/// Escapes parentheses and backslashes in PDF string literals.
fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\\' => escaped.push_str("\\\\"),
            '\n' | '\r' => escaped.push(' '),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders a timestamp in PDF date form `D:YYYYMMDDHHMMSSZ`.
fn pdf_date(timestamp: Timestamp) -> String {
    let datetime = timestamp.inner();
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        datetime.year(),
        u8::from(datetime.month()),
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second(),
    )
}
