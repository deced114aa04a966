// idis-core/src/deliverables/builders.rs
// ============================================================================
// Module: IDIS Deliverable Builders
// Description: Section-structured builders for the deliverable suite.
// Purpose: Assemble memos, snapshots, and dashboards with references intact.
// Dependencies: crate::deliverables::model, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Builders assemble deliverables section by section. Every fact-adding
//! method takes the claim and calc references alongside the text so the
//! No-Free-Facts gate can hold at export time; methods for narrative
//! non-factual content (missing-information notes) mark the fact
//! accordingly. `build` fixes section order and the audit appendix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::CalcId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::DeliverableId;
use crate::core::identifiers::TenantId;
use crate::deliverables::model::Deliverable;
use crate::deliverables::model::DeliverableType;
use crate::deliverables::model::Fact;
use crate::deliverables::model::Section;

// ============================================================================
// SECTION: Common Scaffolding
// ============================================================================

/// Shared builder state across deliverable kinds.
struct BuilderBase {
    /// Deliverable identifier.
    deliverable_id: DeliverableId,
    /// Owning tenant.
    tenant_id: TenantId,
    /// Parent deal.
    deal_id: DealId,
    /// Document title.
    title: String,
    /// Generation timestamp string.
    generated_at: String,
    /// Sections in fixed order.
    sections: Vec<Section>,
}

impl BuilderBase {
    /// Creates the base with the fixed section titles.
    fn new(
        deliverable_id: DeliverableId,
        tenant_id: TenantId,
        deal_id: DealId,
        title: String,
        generated_at: String,
        section_titles: &[&str],
    ) -> Self {
        Self {
            deliverable_id,
            tenant_id,
            deal_id,
            title,
            generated_at,
            sections: section_titles
                .iter()
                .map(|section_title| Section {
                    title: (*section_title).to_string(),
                    facts: Vec::new(),
                })
                .collect(),
        }
    }

    /// Appends a factual statement to a section by index.
    fn add_fact(&mut self, section: usize, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        if let Some(target) = self.sections.get_mut(section) {
            target.facts.push(Fact {
                text: text.to_string(),
                claim_refs: claims,
                calc_refs: calcs,
                is_factual: true,
                is_subjective: false,
            });
        }
    }

    /// Appends a non-factual note to a section by index.
    fn add_note(&mut self, section: usize, text: &str) {
        if let Some(target) = self.sections.get_mut(section) {
            target.facts.push(Fact {
                text: text.to_string(),
                claim_refs: Vec::new(),
                calc_refs: Vec::new(),
                is_factual: false,
                is_subjective: true,
            });
        }
    }

    /// Finalizes the deliverable.
    fn build(self, deliverable_type: DeliverableType) -> Deliverable {
        let mut deliverable = Deliverable {
            deliverable_id: self.deliverable_id,
            tenant_id: self.tenant_id,
            deal_id: self.deal_id,
            deliverable_type,
            title: self.title,
            generated_at: self.generated_at,
            sections: self.sections,
            audit_appendix: Vec::new(),
        };
        deliverable.rebuild_audit_appendix();
        deliverable
    }
}

// ============================================================================
// SECTION: Screening Snapshot
// ============================================================================

/// Builder for the screening-snapshot deliverable.
pub struct ScreeningSnapshotBuilder {
    /// Shared builder state.
    base: BuilderBase,
}

impl ScreeningSnapshotBuilder {
    /// Section order: summary, metrics, red flags, missing information.
    const SECTIONS: [&'static str; 4] =
        ["Summary", "Key Metrics", "Red Flags", "Missing Information"];

    /// Creates a snapshot builder.
    #[must_use]
    pub fn new(
        deliverable_id: DeliverableId,
        tenant_id: TenantId,
        deal_id: DealId,
        deal_name: &str,
        generated_at: &str,
    ) -> Self {
        Self {
            base: BuilderBase::new(
                deliverable_id,
                tenant_id,
                deal_id,
                format!("Screening Snapshot: {deal_name}"),
                generated_at.to_string(),
                &Self::SECTIONS,
            ),
        }
    }

    /// Adds a summary fact.
    pub fn add_summary_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(0, text, claims, calcs);
    }

    /// Adds a key-metric fact.
    pub fn add_metric_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(1, text, claims, calcs);
    }

    /// Adds a red-flag fact.
    pub fn add_red_flag_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(2, text, claims, calcs);
    }

    /// Adds a missing-information note (non-factual).
    pub fn add_missing_info(&mut self, text: &str) {
        self.base.add_note(3, text);
    }

    /// Finalizes the snapshot.
    #[must_use]
    pub fn build(self) -> Deliverable {
        self.base.build(DeliverableType::ScreeningSnapshot)
    }
}

// ============================================================================
// SECTION: IC Memo
// ============================================================================

/// Builder for the investment-committee memo.
pub struct IcMemoBuilder {
    /// Shared builder state.
    base: BuilderBase,
}

impl IcMemoBuilder {
    /// Fixed memo section order.
    const SECTIONS: [&'static str; 8] = [
        "Executive Summary",
        "Company Overview",
        "Market Analysis",
        "Financials",
        "Team Assessment",
        "Risks",
        "Recommendation",
        "Truth Dashboard",
    ];

    /// Creates a memo builder.
    #[must_use]
    pub fn new(
        deliverable_id: DeliverableId,
        tenant_id: TenantId,
        deal_id: DealId,
        deal_name: &str,
        generated_at: &str,
    ) -> Self {
        Self {
            base: BuilderBase::new(
                deliverable_id,
                tenant_id,
                deal_id,
                format!("IC Memo: {deal_name}"),
                generated_at.to_string(),
                &Self::SECTIONS,
            ),
        }
    }

    /// Adds an executive-summary fact.
    pub fn add_executive_summary_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(0, text, claims, calcs);
    }

    /// Adds a company-overview fact.
    pub fn add_company_overview_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(1, text, claims, calcs);
    }

    /// Adds a market-analysis fact.
    pub fn add_market_analysis_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(2, text, claims, calcs);
    }

    /// Adds a financials fact.
    pub fn add_financials_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(3, text, claims, calcs);
    }

    /// Adds a team-assessment fact.
    pub fn add_team_assessment_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(4, text, claims, calcs);
    }

    /// Adds a risk fact.
    pub fn add_risks_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(5, text, claims, calcs);
    }

    /// Adds a recommendation fact.
    pub fn add_recommendation_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(6, text, claims, calcs);
    }

    /// Adds a truth-dashboard fact.
    pub fn add_truth_dashboard_fact(
        &mut self,
        text: &str,
        claims: Vec<ClaimId>,
        calcs: Vec<CalcId>,
    ) {
        self.base.add_fact(7, text, claims, calcs);
    }

    /// Finalizes the memo.
    #[must_use]
    pub fn build(self) -> Deliverable {
        self.base.build(DeliverableType::IcMemo)
    }
}

// ============================================================================
// SECTION: Truth Dashboard
// ============================================================================

/// Builder for the claim-verification truth dashboard.
pub struct TruthDashboardBuilder {
    /// Shared builder state.
    base: BuilderBase,
}

impl TruthDashboardBuilder {
    /// Fixed dashboard section order.
    const SECTIONS: [&'static str; 3] = ["Verification Summary", "Graded Claims", "Open Defects"];

    /// Creates a dashboard builder.
    #[must_use]
    pub fn new(
        deliverable_id: DeliverableId,
        tenant_id: TenantId,
        deal_id: DealId,
        deal_name: &str,
        generated_at: &str,
    ) -> Self {
        Self {
            base: BuilderBase::new(
                deliverable_id,
                tenant_id,
                deal_id,
                format!("Truth Dashboard: {deal_name}"),
                generated_at.to_string(),
                &Self::SECTIONS,
            ),
        }
    }

    /// Adds a verification-summary fact.
    pub fn add_summary_fact(&mut self, text: &str, claims: Vec<ClaimId>, calcs: Vec<CalcId>) {
        self.base.add_fact(0, text, claims, calcs);
    }

    /// Adds a graded-claim fact.
    pub fn add_claim_fact(&mut self, text: &str, claims: Vec<ClaimId>) {
        self.base.add_fact(1, text, claims, Vec::new());
    }

    /// Adds an open-defect fact.
    pub fn add_defect_fact(&mut self, text: &str, claims: Vec<ClaimId>) {
        self.base.add_fact(2, text, claims, Vec::new());
    }

    /// Finalizes the dashboard.
    #[must_use]
    pub fn build(self) -> Deliverable {
        self.base.build(DeliverableType::TruthDashboard)
    }
}
