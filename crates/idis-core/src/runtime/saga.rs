// idis-core/src/runtime/saga.rs
// ============================================================================
// Module: IDIS Dual-Write Saga
// Description: Compensating writes across the relational and graph stores.
// Purpose: Keep Postgres-truth and the Sanad projection consistent.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The saga executor runs an ordered list of steps, each a forward closure
//! paired with a compensation closure. On the first failure it compensates
//! every completed step in reverse order; compensation failures are recorded
//! but never halt further compensations. A saga that cannot roll back
//! surfaces as [`DualWriteConsistencyError`]. The projection service wraps
//! graph writes: an unconfigured graph yields SKIPPED, a projection failure
//! yields FAILED plus a HIGH-severity audit, and a projection failure whose
//! audit also fails yields AUDIT_FAILURE, the worst compound state,
//! surfaced verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::audit::ActorType;
use crate::core::audit::AuditActor;
use crate::core::audit::AuditEvent;
use crate::core::audit::AuditPayload;
use crate::core::audit::AuditRequest;
use crate::core::audit::AuditResource;
use crate::core::audit::AuditSeverity;
use crate::core::audit::HttpMethod;
use crate::core::audit::ResourceType;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::interfaces::AuditSink;
use crate::interfaces::Clock;
use crate::interfaces::EdgeLabel;
use crate::interfaces::GraphError;
use crate::interfaces::GraphStore;
use crate::interfaces::NodeLabel;

// ============================================================================
// SECTION: Saga Model
// ============================================================================

/// Shared context passed through saga steps.
pub type SagaContext = BTreeMap<String, serde_json::Value>;

/// Step execution failures.
#[derive(Debug, Error)]
#[error("saga step failed: {0}")]
pub struct SagaStepError(pub String);

/// Forward action of a saga step; returns an identifier for compensation.
pub type ExecuteFn = Box<dyn Fn(&mut SagaContext) -> Result<String, SagaStepError> + Send + Sync>;
/// Compensation action of a saga step.
pub type CompensateFn =
    Box<dyn Fn(&mut SagaContext, &str) -> Result<(), SagaStepError> + Send + Sync>;

/// One saga step: a forward closure paired with its compensation.
pub struct SagaStep {
    /// Step name for logging and results.
    pub name: String,
    /// Forward action.
    pub execute: ExecuteFn,
    /// Compensation action.
    pub compensate: CompensateFn,
}

/// Per-step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStepStatus {
    /// Forward action completed.
    Completed,
    /// Forward action failed.
    Failed,
    /// Compensation completed.
    Compensated,
    /// Compensation failed.
    CompensationFailed,
}

/// Per-step result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaStepResult {
    /// Step name.
    pub step_name: String,
    /// Terminal status.
    pub status: SagaStepStatus,
    /// Error text, when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall saga outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    /// Every step completed.
    Completed,
    /// A step failed; every completed step compensated cleanly.
    Compensated,
    /// A step failed and at least one compensation also failed.
    CompensationFailed,
}

/// Result of a saga execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaResult {
    /// Saga identifier.
    pub saga_id: String,
    /// Overall status.
    pub status: SagaStatus,
    /// Per-step results in execution then compensation order.
    pub step_results: Vec<SagaStepResult>,
    /// First failure text, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SagaResult {
    /// Returns true when the saga completed without compensation.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SagaStatus::Completed
    }
}

/// Raised when dual-write consistency cannot be restored.
#[derive(Debug, Error)]
#[error("dual-write saga {} failed and could not be compensated", result.saga_id)]
pub struct DualWriteConsistencyError {
    /// The failed saga's full result.
    pub result: SagaResult,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes ordered saga steps with reverse-order compensation.
pub struct SagaExecutor {
    /// Saga identifier.
    saga_id: String,
    /// Ordered steps.
    steps: Vec<SagaStep>,
}

impl SagaExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(saga_id: impl Into<String>) -> Self {
        Self {
            saga_id: saga_id.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn add_step(
        mut self,
        name: impl Into<String>,
        execute: ExecuteFn,
        compensate: CompensateFn,
    ) -> Self {
        self.steps.push(SagaStep {
            name: name.into(),
            execute,
            compensate,
        });
        self
    }

    /// Executes the saga.
    ///
    /// On the first step failure, compensates every completed step in
    /// reverse order; compensation errors are recorded and do not halt the
    /// remaining compensations.
    ///
    /// # Errors
    ///
    /// Returns [`DualWriteConsistencyError`] when compensation itself failed
    /// and the stores may be inconsistent.
    pub fn execute(
        &self,
        initial_context: SagaContext,
    ) -> Result<SagaResult, DualWriteConsistencyError> {
        let mut context = initial_context;
        let mut step_results: Vec<SagaStepResult> = Vec::new();
        let mut completed: Vec<(&SagaStep, String)> = Vec::new();

        for step in &self.steps {
            match (step.execute)(&mut context) {
                Ok(result) => {
                    step_results.push(SagaStepResult {
                        step_name: step.name.clone(),
                        status: SagaStepStatus::Completed,
                        error: None,
                    });
                    completed.push((step, result));
                }
                Err(error) => {
                    step_results.push(SagaStepResult {
                        step_name: step.name.clone(),
                        status: SagaStepStatus::Failed,
                        error: Some(error.to_string()),
                    });
                    tracing::error!(saga = %self.saga_id, step = %step.name, error = %error, "saga step failed");

                    let mut all_compensated = true;
                    for (done, result) in completed.iter().rev() {
                        match (done.compensate)(&mut context, result) {
                            Ok(()) => step_results.push(SagaStepResult {
                                step_name: format!("{}_compensation", done.name),
                                status: SagaStepStatus::Compensated,
                                error: None,
                            }),
                            Err(comp_error) => {
                                all_compensated = false;
                                step_results.push(SagaStepResult {
                                    step_name: format!("{}_compensation", done.name),
                                    status: SagaStepStatus::CompensationFailed,
                                    error: Some(comp_error.to_string()),
                                });
                            }
                        }
                    }

                    let status = if all_compensated {
                        SagaStatus::Compensated
                    } else {
                        SagaStatus::CompensationFailed
                    };
                    let result = SagaResult {
                        saga_id: self.saga_id.clone(),
                        status,
                        step_results,
                        error: Some(error.to_string()),
                    };
                    if status == SagaStatus::CompensationFailed {
                        return Err(DualWriteConsistencyError { result });
                    }
                    return Ok(result);
                }
            }
        }

        Ok(SagaResult {
            saga_id: self.saga_id.clone(),
            status: SagaStatus::Completed,
            step_results,
            error: None,
        })
    }
}

// ============================================================================
// SECTION: In-Memory Graph
// ============================================================================

/// A stored graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GraphNode {
    /// Node label.
    label: NodeLabel,
    /// Node properties.
    properties: BTreeMap<String, String>,
}

/// In-memory graph store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    /// Nodes keyed by `(tenant, entity)`.
    nodes: Mutex<BTreeMap<(TenantId, String), GraphNode>>,
    /// Edges keyed by `(tenant, from, label, to)`.
    edges: Mutex<BTreeMap<(TenantId, String, EdgeLabel, String), ()>>,
    /// Simulated failure switch for projection tests.
    failing: Mutex<bool>,
}

impl InMemoryGraphStore {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the store into a failing mode for tests.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut guard) = self.failing.lock() {
            *guard = failing;
        }
    }

    /// Returns the number of nodes stored for a tenant.
    #[must_use]
    pub fn node_count(&self, tenant_id: &TenantId) -> usize {
        self.nodes
            .lock()
            .map(|guard| guard.keys().filter(|(tenant, _)| tenant == tenant_id).count())
            .unwrap_or(0)
    }

    /// Returns node ids carrying the given label for a tenant.
    #[must_use]
    pub fn nodes_with_label(&self, tenant_id: &TenantId, label: NodeLabel) -> Vec<String> {
        self.nodes
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|((tenant, _), node)| tenant == tenant_id && node.label == label)
                    .map(|((_, id), _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the stored properties of a tenant-scoped node.
    #[must_use]
    pub fn node_properties(
        &self,
        tenant_id: &TenantId,
        entity_id: &str,
    ) -> Option<BTreeMap<String, String>> {
        self.nodes
            .lock()
            .ok()
            .and_then(|guard| {
                guard
                    .get(&(tenant_id.clone(), entity_id.to_string()))
                    .map(|node| node.properties.clone())
            })
    }

    /// Returns true when the failure switch is set.
    fn is_failing(&self) -> bool {
        self.failing.lock().map(|guard| *guard).unwrap_or(true)
    }
}

impl GraphStore for InMemoryGraphStore {
    fn put_node(
        &self,
        tenant_id: &TenantId,
        label: NodeLabel,
        entity_id: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), GraphError> {
        if self.is_failing() {
            return Err(GraphError::Store("graph backend unavailable".to_string()));
        }
        self.nodes
            .lock()
            .map_err(|_| GraphError::Store("graph mutex poisoned".to_string()))?
            .insert(
                (tenant_id.clone(), entity_id.to_string()),
                GraphNode {
                    label,
                    properties: properties.clone(),
                },
            );
        Ok(())
    }

    fn put_edge(
        &self,
        tenant_id: &TenantId,
        from_id: &str,
        label: EdgeLabel,
        to_id: &str,
    ) -> Result<(), GraphError> {
        if self.is_failing() {
            return Err(GraphError::Store("graph backend unavailable".to_string()));
        }
        self.edges
            .lock()
            .map_err(|_| GraphError::Store("graph mutex poisoned".to_string()))?
            .insert((tenant_id.clone(), from_id.to_string(), label, to_id.to_string()), ());
        Ok(())
    }

    fn delete_node(&self, tenant_id: &TenantId, entity_id: &str) -> Result<(), GraphError> {
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|_| GraphError::Store("graph mutex poisoned".to_string()))?;
        nodes.remove(&(tenant_id.clone(), entity_id.to_string()));
        let mut edges = self
            .edges
            .lock()
            .map_err(|_| GraphError::Store("graph mutex poisoned".to_string()))?;
        edges.retain(|(tenant, from, _, to), _| {
            !(tenant == tenant_id && (from == entity_id || to == entity_id))
        });
        Ok(())
    }

    fn has_node(&self, tenant_id: &TenantId, entity_id: &str) -> Result<bool, GraphError> {
        Ok(self
            .nodes
            .lock()
            .map_err(|_| GraphError::Store("graph mutex poisoned".to_string()))?
            .contains_key(&(tenant_id.clone(), entity_id.to_string())))
    }
}

// ============================================================================
// SECTION: Projection Service
// ============================================================================

/// Terminal status of a projection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionStatus {
    /// Projection written to the graph.
    Completed,
    /// No graph configured; projection skipped, not an error.
    Skipped,
    /// Projection failed; failure audited.
    Failed,
    /// Projection failed and the failure audit also failed.
    AuditFailure,
}

/// Projects entities into the provenance graph with audited failures.
pub struct ProjectionService {
    /// Optional graph backend; `None` projects as SKIPPED.
    graph: Option<Arc<dyn GraphStore>>,
    /// Audit sink for projection failures.
    audit: Arc<dyn AuditSink>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl ProjectionService {
    /// Creates a projection service.
    #[must_use]
    pub fn new(
        graph: Option<Arc<dyn GraphStore>>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { graph, audit, clock }
    }

    /// Projects one entity node keyed by `(tenant_id, entity_id)`.
    #[must_use]
    pub fn project_entity(
        &self,
        tenant_id: &TenantId,
        label: NodeLabel,
        entity_kind: &str,
        entity_id: &str,
        properties: &BTreeMap<String, String>,
    ) -> ProjectionStatus {
        let Some(graph) = &self.graph else {
            return ProjectionStatus::Skipped;
        };
        match graph.put_node(tenant_id, label, entity_id, properties) {
            Ok(()) => ProjectionStatus::Completed,
            Err(error) => {
                tracing::error!(tenant = %tenant_id, entity = entity_id, error = %error, "graph projection failed");
                match self.emit_failure_audit(tenant_id, entity_kind, entity_id, &error) {
                    Ok(()) => ProjectionStatus::Failed,
                    Err(_) => ProjectionStatus::AuditFailure,
                }
            }
        }
    }

    /// Emits the `graph_projection.*.failed` HIGH-severity audit event.
    fn emit_failure_audit(
        &self,
        tenant_id: &TenantId,
        entity_kind: &str,
        entity_id: &str,
        error: &GraphError,
    ) -> Result<(), crate::interfaces::AuditSinkError> {
        let event = AuditEvent {
            event_id: EventId::mint(),
            occurred_at: self.clock.now(),
            tenant_id: tenant_id.clone(),
            actor: AuditActor {
                actor_type: ActorType::Service,
                actor_id: ActorId::new("graph-projection"),
                roles: vec!["INTEGRATION_SERVICE".to_string()],
                ip: "internal".to_string(),
                user_agent: "idis-projection".to_string(),
            },
            request: AuditRequest {
                request_id: RequestId::mint(),
                method: HttpMethod::Post,
                path: "/internal/graph-projection".to_string(),
                status_code: 500,
                idempotency_key: None,
            },
            resource: AuditResource {
                resource_type: ResourceType::Integration,
                resource_id: entity_id.to_string(),
            },
            event_type: format!("graph_projection.{entity_kind}.failed"),
            severity: AuditSeverity::High,
            summary: format!("Graph projection failed for {entity_kind} {entity_id}"),
            payload: AuditPayload {
                hashes: Vec::new(),
                refs: vec![format!("{entity_kind}:{entity_id}")],
                safe: BTreeMap::from([(
                    "error".to_string(),
                    serde_json::Value::String(error.to_string()),
                )]),
            },
        };
        self.audit.emit(&event)
    }
}
