// idis-core/src/deliverables/mod.rs
// ============================================================================
// Module: IDIS Deliverables
// Description: Deliverable model, builders, NFF gate, and exporters.
// Purpose: Produce validated, byte-deterministic PDF and DOCX artifacts.
// Dependencies: crate::{core, validators}
// ============================================================================

//! ## Overview
//! Deliverables are ordered sections of ordered facts with an audit appendix
//! listing every claim and calc reference. The No-Free-Facts gate runs
//! before any export. Renderers emit a canonical text-block intermediate
//! representation; the PDF and DOCX writers fix every timestamp to the
//! caller-supplied export time so identical inputs produce byte-identical
//! artifacts across processes and platforms.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod builders;
pub mod docx;
pub mod export;
pub mod model;
pub mod pdf;
pub mod render;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builders::IcMemoBuilder;
pub use builders::ScreeningSnapshotBuilder;
pub use builders::TruthDashboardBuilder;
pub use export::DeliverableExportError;
pub use export::ExportFormat;
pub use export::ExportResult;
pub use export::export_to_docx;
pub use export::export_to_pdf;
pub use model::AuditRef;
pub use model::Deliverable;
pub use model::DeliverableType;
pub use model::Fact;
pub use model::RefType;
pub use model::Section;
