// idis-core/src/deliverables/render.rs
// ============================================================================
// Module: IDIS Deliverable Rendering
// Description: Canonical text-block intermediate representation.
// Purpose: One ordering choke point feeding both PDF and DOCX writers.
// Dependencies: crate::deliverables::model
// ============================================================================

//! ## Overview
//! Both exporters render from the same canonical intermediate representation:
//! an ordered list of heading and body blocks. Order is fully determined by
//! the deliverable structure: title, sections in order, facts in order, then
//! the sorted audit appendix. The writers never make an ordering decision
//! of their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::deliverables::model::Deliverable;
use crate::deliverables::model::RefType;

// ============================================================================
// SECTION: Block Model
// ============================================================================

/// Block kinds in the canonical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Document title.
    Title,
    /// Section heading.
    Heading,
    /// Body text.
    Body,
}

/// One ordered text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Block kind.
    pub kind: BlockKind,
    /// Block text.
    pub text: String,
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a deliverable to its canonical block list.
#[must_use]
pub fn render_blocks(deliverable: &Deliverable, include_audit_appendix: bool) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    blocks.push(TextBlock {
        kind: BlockKind::Title,
        text: deliverable.title.clone(),
    });
    blocks.push(TextBlock {
        kind: BlockKind::Body,
        text: format!("Generated at {}", deliverable.generated_at),
    });

    for section in &deliverable.sections {
        blocks.push(TextBlock {
            kind: BlockKind::Heading,
            text: section.title.clone(),
        });
        for fact in &section.facts {
            blocks.push(TextBlock {
                kind: BlockKind::Body,
                text: fact.text.clone(),
            });
        }
    }

    if include_audit_appendix {
        blocks.push(TextBlock {
            kind: BlockKind::Heading,
            text: "Audit Appendix".to_string(),
        });
        for reference in &deliverable.audit_appendix {
            let kind = match reference.ref_type {
                RefType::Claim => "CLAIM",
                RefType::Calc => "CALC",
            };
            blocks.push(TextBlock {
                kind: BlockKind::Body,
                text: format!("{kind} {}", reference.ref_id),
            });
        }
    }

    blocks
}
