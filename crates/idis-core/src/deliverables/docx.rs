// idis-core/src/deliverables/docx.rs
// ============================================================================
// Module: IDIS DOCX Writer
// Description: Deterministic DOCX (OPC zip) emission from text blocks.
// Purpose: Byte-identical DOCX output for identical inputs.
// Dependencies: crate::deliverables::render
// ============================================================================

//! ## Overview
//! A DOCX file is an OPC zip archive. The writer emits the three mandatory
//! parts (content types, package relationships, and the document body) as
//! STORED zip entries in a fixed sorted order with a fixed DOS timestamp, so
//! identical inputs produce identical bytes on every platform. Storing
//! entries uncompressed keeps the container independent of any compressor
//! implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::deliverables::render::BlockKind;
use crate::deliverables::render::TextBlock;

// ============================================================================
// SECTION: Fixed Timestamp
// ============================================================================

/// Fixed DOS date: 1980-01-01.
const DOS_DATE: u16 = 0x0021;
/// Fixed DOS time: 00:00:00.
const DOS_TIME: u16 = 0x0000;

// ============================================================================
// SECTION: Writer
// ============================================================================

/// Writes a deterministic DOCX archive from the canonical block list.
#[must_use]
pub fn write_docx(blocks: &[TextBlock]) -> Vec<u8> {
    // Entry names stay in this sorted order; reordering changes the bytes.
    let entries: [(&str, Vec<u8>); 3] = [
        ("[Content_Types].xml", content_types_xml().into_bytes()),
        ("_rels/.rels", rels_xml().into_bytes()),
        ("word/document.xml", document_xml(blocks).into_bytes()),
    ];

    let mut out: Vec<u8> = Vec::new();
    let mut central: Vec<u8> = Vec::new();
    let mut entry_count: u16 = 0;

    for (name, data) in &entries {
        let offset = u32::try_from(out.len()).unwrap_or(u32::MAX);
        let crc = crc32(data);
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let name_bytes = name.as_bytes();
        let name_len = u16::try_from(name_bytes.len()).unwrap_or(u16::MAX);

        // Local file header.
        out.extend_from_slice(&0x0403_4b50_u32.to_le_bytes());
        out.extend_from_slice(&20_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&DOS_TIME.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&name_len.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(data);

        // Central directory record.
        central.extend_from_slice(&0x0201_4b50_u32.to_le_bytes());
        central.extend_from_slice(&20_u16.to_le_bytes());
        central.extend_from_slice(&20_u16.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&DOS_TIME.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&name_len.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&0_u16.to_le_bytes());
        central.extend_from_slice(&0_u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name_bytes);

        entry_count += 1;
    }

    let central_offset = u32::try_from(out.len()).unwrap_or(u32::MAX);
    let central_size = u32::try_from(central.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&central);

    // End of central directory.
    out.extend_from_slice(&0x0605_4b50_u32.to_le_bytes());
    out.extend_from_slice(&0_u16.to_le_bytes());
    out.extend_from_slice(&0_u16.to_le_bytes());
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&central_size.to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0_u16.to_le_bytes());

    out
}

// ============================================================================
// SECTION: Package Parts
// ============================================================================

/// The `[Content_Types].xml` part.
fn content_types_xml() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        "<Default Extension=\"rels\" ",
        "ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
        "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
        "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.",
        "openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
        "</Types>",
    )
    .to_string()
}

/// The package relationships part.
fn rels_xml() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/",
        "2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
        "</Relationships>",
    )
    .to_string()
}

/// The WordprocessingML document body.
fn document_xml(blocks: &[TextBlock]) -> String {
    let mut body = String::new();
    for block in blocks {
        let style = match block.kind {
            BlockKind::Title => "<w:pStyle w:val=\"Title\"/>",
            BlockKind::Heading => "<w:pStyle w:val=\"Heading1\"/>",
            BlockKind::Body => "",
        };
        body.push_str(&format!(
            "<w:p><w:pPr>{style}</w:pPr><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_xml(&block.text)
        ));
    }
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/",
            "wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        ),
        body
    )
}

/// Escapes XML special characters.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ============================================================================
// SECTION: CRC-32
// ============================================================================

/// Computes the IEEE CRC-32 of a byte slice.
fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for byte in data {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
