// idis-core/src/core/mod.rs
// ============================================================================
// Module: IDIS Core Types
// Description: Canonical IDIS data model and primitive value types.
// Purpose: Provide stable, serializable types for claims, evidence, and runs.
// Dependencies: serde, bigdecimal, time
// ============================================================================

//! ## Overview
//! IDIS core types define the diligence data model: deals, documents, spans,
//! claims, evidence chains (Sanad), defects, deterministic calculations, run
//! ledgers, and audit events. These types are the canonical source of truth
//! for any derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod calc;
pub mod claim;
pub mod deal;
pub mod debate;
pub mod decimal;
pub mod defect;
pub mod document;
pub mod envelope;
pub mod evidence;
pub mod hashing;
pub mod identifiers;
pub mod run;
pub mod sanad;
pub mod time;
pub mod value_struct;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::ActorType;
pub use audit::AuditActor;
pub use audit::AuditEvent;
pub use audit::AuditPayload;
pub use audit::AuditRequest;
pub use audit::AuditResource;
pub use audit::AuditSeverity;
pub use audit::HttpMethod;
pub use audit::ResourceType;
pub use audit::VALID_EVENT_PREFIXES;
pub use calc::CalcInputs;
pub use calc::CalcOutput;
pub use calc::CalcSanad;
pub use calc::CalcType;
pub use calc::DeterministicCalculation;
pub use calc::GradeExplanationEntry;
pub use claim::Claim;
pub use claim::ClaimAction;
pub use claim::ClaimClass;
pub use claim::ClaimVerdict;
pub use claim::Grade;
pub use claim::Materiality;
pub use deal::Deal;
pub use deal::DealStage;
pub use deal::DealStatus;
pub use debate::AgentOutput;
pub use debate::AgentRole;
pub use debate::DebateContent;
pub use debate::MuhasabahRecord;
pub use decimal::Dec;
pub use decimal::DecimalError;
pub use defect::CureProtocol;
pub use defect::Defect;
pub use defect::DefectSeverity;
pub use defect::DefectStatus;
pub use defect::DefectType;
pub use document::Document;
pub use document::DocumentRef;
pub use document::DocumentType;
pub use document::Span;
pub use document::SpanLocator;
pub use document::SpanType;
pub use envelope::ErrorEnvelope;
pub use envelope::codes;
pub use evidence::CoiDisclosure;
pub use evidence::EvidenceItem;
pub use evidence::SourceType;
pub use evidence::VerificationMethod;
pub use evidence::VerificationStatus;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use hashing::sha256_hex;
pub use identifiers::ActorId;
pub use identifiers::CalcId;
pub use identifiers::ClaimId;
pub use identifiers::DealId;
pub use identifiers::DefectId;
pub use identifiers::DeliverableId;
pub use identifiers::DocumentId;
pub use identifiers::EventId;
pub use identifiers::EvidenceId;
pub use identifiers::HoldId;
pub use identifiers::NodeId;
pub use identifiers::RequestId;
pub use identifiers::RunId;
pub use identifiers::SanadId;
pub use identifiers::SpanId;
pub use identifiers::StepId;
pub use identifiers::TenantId;
pub use identifiers::new_uuid;
pub use run::Run;
pub use run::RunMode;
pub use run::RunStatus;
pub use run::RunStep;
pub use run::StepName;
pub use run::StepStatus;
pub use sanad::CorroborationLevel;
pub use sanad::Sanad;
pub use sanad::TransmissionNode;
pub use time::Timestamp;
pub use value_struct::Currency;
pub use value_struct::SemanticTag;
pub use value_struct::TimeWindow;
pub use value_struct::ValueStruct;
pub use value_struct::ValueStructError;
