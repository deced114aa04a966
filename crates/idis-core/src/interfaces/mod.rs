// idis-core/src/interfaces/mod.rs
// ============================================================================
// Module: IDIS Interfaces
// Description: Backend-agnostic interfaces for storage, audit, and graph.
// Purpose: Define the contract surfaces used by the IDIS engines.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how IDIS integrates with storage and projection backends
//! without embedding backend-specific details. Implementations must be
//! tenant-scoped and fail closed: cross-tenant reads return `None` (never a
//! permission error), and any audit-sink failure aborts the mutation that
//! produced the event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::audit::AuditEvent;
use crate::core::claim::Claim;
use crate::core::deal::Deal;
use crate::core::defect::Defect;
use crate::core::document::Document;
use crate::core::evidence::EvidenceItem;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::ClaimId;
use crate::core::identifiers::DealId;
use crate::core::identifiers::DefectId;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::SanadId;
use crate::core::identifiers::TenantId;
use crate::core::run::Run;
use crate::core::run::RunStep;
use crate::core::run::StepName;
use crate::core::sanad::Sanad;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source injected into engines so replay stays deterministic.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation for hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ============================================================================
// SECTION: Repository Errors
// ============================================================================

/// Repository errors shared by all backends.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Backend I/O or engine error.
    #[error("repository error: {0}")]
    Storage(String),
    /// Entity tenant does not match the repository tenant scope.
    #[error("tenant mismatch on write")]
    TenantMismatch,
    /// Update target does not exist in the tenant scope.
    #[error("entity not found: {0}")]
    NotFound(String),
    /// Stored data failed to decode.
    #[error("repository corruption: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Repositories
// ============================================================================

/// Tenant-scoped deal persistence.
pub trait DealRepository: Send + Sync {
    /// Persists a new deal.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, deal: &Deal) -> Result<(), RepoError>;

    /// Loads a deal; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(&self, tenant_id: &TenantId, deal_id: &DealId) -> Result<Option<Deal>, RepoError>;

    /// Updates an existing deal.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the deal is absent in scope.
    fn update(&self, deal: &Deal) -> Result<(), RepoError>;

    /// Lists deals for a tenant ordered by creation time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn list(&self, tenant_id: &TenantId) -> Result<Vec<Deal>, RepoError>;
}

/// Tenant-scoped document persistence.
pub trait DocumentRepository: Send + Sync {
    /// Persists a new document version.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, deal_id: &DealId, document: &Document) -> Result<(), RepoError>;

    /// Loads a document; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Option<Document>, RepoError>;

    /// Lists all document versions for a deal.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn list_for_deal(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
    ) -> Result<Vec<Document>, RepoError>;
}

/// Tenant-scoped claim persistence.
pub trait ClaimRepository: Send + Sync {
    /// Persists a new claim.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, claim: &Claim) -> Result<(), RepoError>;

    /// Loads a claim; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(&self, tenant_id: &TenantId, claim_id: &ClaimId) -> Result<Option<Claim>, RepoError>;

    /// Updates an existing claim.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the claim is absent in scope.
    fn update(&self, claim: &Claim) -> Result<(), RepoError>;

    /// Lists claims for a deal ordered by creation time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn list_for_deal(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
    ) -> Result<Vec<Claim>, RepoError>;
}

/// Tenant-scoped evidence persistence.
pub trait EvidenceRepository: Send + Sync {
    /// Persists a new evidence item.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, evidence: &EvidenceItem) -> Result<(), RepoError>;

    /// Loads an evidence item; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(
        &self,
        tenant_id: &TenantId,
        evidence_id: &EvidenceId,
    ) -> Result<Option<EvidenceItem>, RepoError>;
}

/// Tenant-scoped sanad persistence.
pub trait SanadRepository: Send + Sync {
    /// Persists a new sanad.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, sanad: &Sanad) -> Result<(), RepoError>;

    /// Loads a sanad; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(&self, tenant_id: &TenantId, sanad_id: &SanadId) -> Result<Option<Sanad>, RepoError>;

    /// Updates an existing sanad.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the sanad is absent in scope.
    fn update(&self, sanad: &Sanad) -> Result<(), RepoError>;
}

/// Tenant-scoped defect persistence.
pub trait DefectRepository: Send + Sync {
    /// Persists a new defect.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, defect: &Defect) -> Result<(), RepoError>;

    /// Loads a defect; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(
        &self,
        tenant_id: &TenantId,
        defect_id: &DefectId,
    ) -> Result<Option<Defect>, RepoError>;

    /// Updates an existing defect.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the defect is absent in scope.
    fn update(&self, defect: &Defect) -> Result<(), RepoError>;

    /// Lists defects for a claim.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn list_for_claim(
        &self,
        tenant_id: &TenantId,
        claim_id: &ClaimId,
    ) -> Result<Vec<Defect>, RepoError>;
}

/// Tenant-scoped run persistence.
pub trait RunRepository: Send + Sync {
    /// Persists a new run.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, run: &Run) -> Result<(), RepoError>;

    /// Loads a run; cross-tenant reads return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get(&self, tenant_id: &TenantId, run_id: &RunId) -> Result<Option<Run>, RepoError>;

    /// Updates an existing run.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the run is absent in scope.
    fn update(&self, run: &Run) -> Result<(), RepoError>;
}

/// Tenant-scoped run-step ledger persistence.
pub trait RunStepRepository: Send + Sync {
    /// Persists a new step record.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure or tenant mismatch.
    fn create(&self, step: &RunStep) -> Result<(), RepoError>;

    /// Updates an existing step record.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when the step is absent in scope.
    fn update(&self, step: &RunStep) -> Result<(), RepoError>;

    /// Returns all steps for a run sorted by `step_order` ascending.
    ///
    /// Cross-tenant run ids return an empty list (no existence leak).
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn steps_for_run(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
    ) -> Result<Vec<RunStep>, RepoError>;

    /// Returns a specific step by run and canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on storage failure.
    fn get_step(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
        step_name: StepName,
    ) -> Result<Option<RunStep>, RepoError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit sink errors.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    /// Sink I/O failure.
    #[error("audit sink io error: {0}")]
    Io(String),
    /// Event serialization failure.
    #[error("audit sink encoding error: {0}")]
    Encoding(String),
    /// Sink rejected the event.
    #[error("audit sink rejected event: {0}")]
    Rejected(String),
}

/// Append-only audit event sink.
///
/// Emission must be atomic with the mutation that produced the event: a
/// file-backed sink fsyncs before returning, a transactional sink joins the
/// mutation's transaction. Any error here aborts the mutation.
pub trait AuditSink: Send + Sync {
    /// Appends one event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError`] when the event cannot be durably recorded.
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditSinkError>;
}

// ============================================================================
// SECTION: Security Stores
// ============================================================================

/// Deal assignment store backing ABAC decisions.
///
/// Implementations must be tenant-scoped and deny by default: unknown deals
/// return `false` with no existence leak.
pub trait DealAssignmentStore: Send + Sync {
    /// Returns true when the actor is directly assigned to the deal.
    fn is_actor_assigned(&self, tenant_id: &TenantId, deal_id: &DealId, actor_id: &ActorId)
    -> bool;

    /// Returns true when the actor is in a group assigned to the deal.
    fn is_actor_in_deal_group(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        actor_id: &ActorId,
    ) -> bool;
}

/// Claim-to-deal resolution errors.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Resolution infrastructure is configured but unavailable.
    #[error("claim resolution unavailable")]
    Unavailable,
}

/// Resolves a claim to its parent deal under tenant scope.
///
/// Unknown or cross-tenant claims resolve to `None` (no existence leak).
pub trait ClaimDealResolver: Send + Sync {
    /// Resolves `claim_id` to its parent deal.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Unavailable`] when the backing store is
    /// configured but unreachable (fail-closed).
    fn resolve_deal_id_for_claim(
        &self,
        tenant_id: &TenantId,
        claim_id: &ClaimId,
    ) -> Result<Option<DealId>, ResolutionError>;
}

// ============================================================================
// SECTION: Graph Store
// ============================================================================

/// Graph store errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Backend failure.
    #[error("graph store error: {0}")]
    Store(String),
}

/// Node labels in the provenance graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeLabel {
    /// A deal node.
    Deal,
    /// A document node.
    Document,
    /// A span node.
    Span,
    /// A claim node.
    Claim,
    /// An evidence-item node.
    EvidenceItem,
    /// A transmission node.
    TransmissionNode,
    /// A calculation node.
    Calculation,
    /// A defect node.
    Defect,
    /// A named entity node.
    Entity,
}

/// Edge labels in the provenance graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeLabel {
    /// Deal to document.
    HasDocument,
    /// Document to span.
    HasSpan,
    /// Claim to evidence.
    SupportedBy,
    /// Sanad step ordering.
    HasSanadStep,
    /// Calculation input.
    Input,
    /// Calculation output.
    Output,
    /// Claim to defect.
    HasDefect,
    /// Derived provenance.
    DerivedFrom,
    /// Entity mention.
    MentionedIn,
}

/// Provenance graph projection store.
///
/// Every write is keyed by `(tenant_id, entity_id)`; no read or write may
/// traverse without the tenant key.
pub trait GraphStore: Send + Sync {
    /// Upserts a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on backend failure.
    fn put_node(
        &self,
        tenant_id: &TenantId,
        label: NodeLabel,
        entity_id: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), GraphError>;

    /// Upserts an edge between two tenant-scoped nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on backend failure.
    fn put_edge(
        &self,
        tenant_id: &TenantId,
        from_id: &str,
        label: EdgeLabel,
        to_id: &str,
    ) -> Result<(), GraphError>;

    /// Deletes a node and its incident edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on backend failure.
    fn delete_node(&self, tenant_id: &TenantId, entity_id: &str) -> Result<(), GraphError>;

    /// Returns true when a tenant-scoped node exists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on backend failure.
    fn has_node(&self, tenant_id: &TenantId, entity_id: &str) -> Result<bool, GraphError>;
}
