// idis-core/src/runtime/store.rs
// ============================================================================
// Module: IDIS In-Memory Store
// Description: Tenant-scoped in-memory repositories for tests and local runs.
// Purpose: Provide deterministic repository implementations without a DB.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! One shared in-memory store implements every repository trait behind the
//! same contracts as the durable backend: tenant-scoped reads, not-found for
//! cross-tenant access, and typed errors on tenant-mismatched writes. Not
//! intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::claim::Claim;
use crate::core::deal::Deal;
use crate::core::defect::Defect;
use crate::core::document::Document;
use crate::core::evidence::EvidenceItem;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::DefectId;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::StepId;
use crate::core::identifiers::TenantId;
use crate::core::run::Run;
use crate::core::run::RunStep;
use crate::core::run::StepName;
use crate::core::sanad::Sanad;
use crate::interfaces::ClaimRepository;
use crate::interfaces::DealRepository;
use crate::interfaces::DefectRepository;
use crate::interfaces::DocumentRepository;
use crate::interfaces::EvidenceRepository;
use crate::interfaces::RepoError;
use crate::interfaces::RunRepository;
use crate::interfaces::RunStepRepository;
use crate::interfaces::SanadRepository;

// ============================================================================
// SECTION: Store State
// ============================================================================

/// Mutable table state behind one mutex.
#[derive(Debug, Default)]
struct StoreState {
    /// Deals keyed by id.
    deals: BTreeMap<DealId, Deal>,
    /// Documents keyed by id, with owning deal.
    documents: BTreeMap<DocumentId, (DealId, Document)>,
    /// Claims keyed by id.
    claims: BTreeMap<ClaimId, Claim>,
    /// Evidence keyed by id.
    evidence: BTreeMap<EvidenceId, EvidenceItem>,
    /// Sanads keyed by id.
    sanads: BTreeMap<SanadId, Sanad>,
    /// Defects keyed by id.
    defects: BTreeMap<DefectId, Defect>,
    /// Runs keyed by id.
    runs: BTreeMap<RunId, Run>,
    /// Run steps keyed by id.
    run_steps: BTreeMap<StepId, RunStep>,
}

/// Shared in-memory repository backing for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    /// Table state guarded by a mutex.
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure over the locked state.
    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RepoError::Storage("in-memory store mutex poisoned".to_string()))?;
        f(&mut guard)
    }
}

// ============================================================================
// SECTION: Deal Repository
// ============================================================================

impl DealRepository for InMemoryStore {
    fn create(&self, deal: &Deal) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.deals.insert(deal.deal_id.clone(), deal.clone());
            Ok(())
        })
    }

    fn get(&self, tenant_id: &TenantId, deal_id: &DealId) -> Result<Option<Deal>, RepoError> {
        self.with_state(|state| {
            Ok(state.deals.get(deal_id).filter(|deal| &deal.tenant_id == tenant_id).cloned())
        })
    }

    fn update(&self, deal: &Deal) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing = state
                .deals
                .get(&deal.deal_id)
                .filter(|current| current.tenant_id == deal.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(deal.deal_id.to_string()));
            }
            state.deals.insert(deal.deal_id.clone(), deal.clone());
            Ok(())
        })
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<Deal>, RepoError> {
        self.with_state(|state| {
            let mut deals: Vec<Deal> = state
                .deals
                .values()
                .filter(|deal| &deal.tenant_id == tenant_id)
                .cloned()
                .collect();
            deals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(deals)
        })
    }
}

// ============================================================================
// SECTION: Document Repository
// ============================================================================

impl DocumentRepository for InMemoryStore {
    fn create(&self, deal_id: &DealId, document: &Document) -> Result<(), RepoError> {
        self.with_state(|state| {
            state
                .documents
                .insert(document.document_id.clone(), (deal_id.clone(), document.clone()));
            Ok(())
        })
    }

    fn get(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Option<Document>, RepoError> {
        self.with_state(|state| {
            Ok(state
                .documents
                .get(document_id)
                .filter(|(_, document)| &document.tenant_id == tenant_id)
                .map(|(_, document)| document.clone()))
        })
    }

    fn list_for_deal(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
    ) -> Result<Vec<Document>, RepoError> {
        self.with_state(|state| {
            let mut documents: Vec<Document> = state
                .documents
                .values()
                .filter(|(owner, document)| owner == deal_id && &document.tenant_id == tenant_id)
                .map(|(_, document)| document.clone())
                .collect();
            documents.sort_by(|a, b| {
                a.document_id.cmp(&b.document_id).then(a.version.cmp(&b.version))
            });
            Ok(documents)
        })
    }
}

// ============================================================================
// SECTION: Claim Repository
// ============================================================================

impl ClaimRepository for InMemoryStore {
    fn create(&self, claim: &Claim) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.claims.insert(claim.claim_id.clone(), claim.clone());
            Ok(())
        })
    }

    fn get(&self, tenant_id: &TenantId, claim_id: &ClaimId) -> Result<Option<Claim>, RepoError> {
        self.with_state(|state| {
            Ok(state.claims.get(claim_id).filter(|claim| &claim.tenant_id == tenant_id).cloned())
        })
    }

    fn update(&self, claim: &Claim) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing = state
                .claims
                .get(&claim.claim_id)
                .filter(|current| current.tenant_id == claim.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(claim.claim_id.to_string()));
            }
            state.claims.insert(claim.claim_id.clone(), claim.clone());
            Ok(())
        })
    }

    fn list_for_deal(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
    ) -> Result<Vec<Claim>, RepoError> {
        self.with_state(|state| {
            let mut claims: Vec<Claim> = state
                .claims
                .values()
                .filter(|claim| &claim.tenant_id == tenant_id && &claim.deal_id == deal_id)
                .cloned()
                .collect();
            claims.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.claim_id.cmp(&b.claim_id)));
            Ok(claims)
        })
    }
}

// ============================================================================
// SECTION: Evidence Repository
// ============================================================================

impl EvidenceRepository for InMemoryStore {
    fn create(&self, evidence: &EvidenceItem) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.evidence.insert(evidence.evidence_id.clone(), evidence.clone());
            Ok(())
        })
    }

    fn get(
        &self,
        tenant_id: &TenantId,
        evidence_id: &EvidenceId,
    ) -> Result<Option<EvidenceItem>, RepoError> {
        self.with_state(|state| {
            Ok(state
                .evidence
                .get(evidence_id)
                .filter(|item| &item.tenant_id == tenant_id)
                .cloned())
        })
    }
}

// ============================================================================
// SECTION: Sanad Repository
// ============================================================================

impl SanadRepository for InMemoryStore {
    fn create(&self, sanad: &Sanad) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.sanads.insert(sanad.sanad_id.clone(), sanad.clone());
            Ok(())
        })
    }

    fn get(&self, tenant_id: &TenantId, sanad_id: &SanadId) -> Result<Option<Sanad>, RepoError> {
        self.with_state(|state| {
            Ok(state.sanads.get(sanad_id).filter(|sanad| &sanad.tenant_id == tenant_id).cloned())
        })
    }

    fn update(&self, sanad: &Sanad) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing = state
                .sanads
                .get(&sanad.sanad_id)
                .filter(|current| current.tenant_id == sanad.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(sanad.sanad_id.to_string()));
            }
            state.sanads.insert(sanad.sanad_id.clone(), sanad.clone());
            Ok(())
        })
    }
}

// ============================================================================
// SECTION: Defect Repository
// ============================================================================

impl DefectRepository for InMemoryStore {
    fn create(&self, defect: &Defect) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.defects.insert(defect.defect_id.clone(), defect.clone());
            Ok(())
        })
    }

    fn get(
        &self,
        tenant_id: &TenantId,
        defect_id: &DefectId,
    ) -> Result<Option<Defect>, RepoError> {
        self.with_state(|state| {
            Ok(state
                .defects
                .get(defect_id)
                .filter(|defect| &defect.tenant_id == tenant_id)
                .cloned())
        })
    }

    fn update(&self, defect: &Defect) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing = state
                .defects
                .get(&defect.defect_id)
                .filter(|current| current.tenant_id == defect.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(defect.defect_id.to_string()));
            }
            state.defects.insert(defect.defect_id.clone(), defect.clone());
            Ok(())
        })
    }

    fn list_for_claim(
        &self,
        tenant_id: &TenantId,
        claim_id: &ClaimId,
    ) -> Result<Vec<Defect>, RepoError> {
        self.with_state(|state| {
            let mut defects: Vec<Defect> = state
                .defects
                .values()
                .filter(|defect| &defect.tenant_id == tenant_id && &defect.claim_id == claim_id)
                .cloned()
                .collect();
            defects.sort_by(|a, b| a.defect_id.cmp(&b.defect_id));
            Ok(defects)
        })
    }
}

// ============================================================================
// SECTION: Run Repositories
// ============================================================================

impl RunRepository for InMemoryStore {
    fn create(&self, run: &Run) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.runs.insert(run.run_id.clone(), run.clone());
            Ok(())
        })
    }

    fn get(&self, tenant_id: &TenantId, run_id: &RunId) -> Result<Option<Run>, RepoError> {
        self.with_state(|state| {
            Ok(state.runs.get(run_id).filter(|run| &run.tenant_id == tenant_id).cloned())
        })
    }

    fn update(&self, run: &Run) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing =
                state.runs.get(&run.run_id).filter(|current| current.tenant_id == run.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(run.run_id.to_string()));
            }
            state.runs.insert(run.run_id.clone(), run.clone());
            Ok(())
        })
    }
}

impl RunStepRepository for InMemoryStore {
    fn create(&self, step: &RunStep) -> Result<(), RepoError> {
        self.with_state(|state| {
            state.run_steps.insert(step.step_id.clone(), step.clone());
            Ok(())
        })
    }

    fn update(&self, step: &RunStep) -> Result<(), RepoError> {
        self.with_state(|state| {
            let existing = state
                .run_steps
                .get(&step.step_id)
                .filter(|current| current.tenant_id == step.tenant_id);
            if existing.is_none() {
                return Err(RepoError::NotFound(step.step_id.to_string()));
            }
            state.run_steps.insert(step.step_id.clone(), step.clone());
            Ok(())
        })
    }

    fn steps_for_run(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
    ) -> Result<Vec<RunStep>, RepoError> {
        self.with_state(|state| {
            let mut steps: Vec<RunStep> = state
                .run_steps
                .values()
                .filter(|step| &step.tenant_id == tenant_id && &step.run_id == run_id)
                .cloned()
                .collect();
            steps.sort_by_key(|step| step.step_order);
            Ok(steps)
        })
    }

    fn get_step(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
        step_name: StepName,
    ) -> Result<Option<RunStep>, RepoError> {
        self.with_state(|state| {
            Ok(state
                .run_steps
                .values()
                .find(|step| {
                    &step.tenant_id == tenant_id
                        && &step.run_id == run_id
                        && step.step_name == step_name
                })
                .cloned())
        })
    }
}
