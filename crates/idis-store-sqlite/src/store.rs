// idis-store-sqlite/src/store.rs
// ============================================================================
// Module: IDIS SQLite Store
// Description: Durable repositories and the transactional audit sink.
// Purpose: Tenant-scoped persistence with mutation-atomic audit emission.
// Dependencies: idis-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Entities persist as canonical JSON snapshots alongside their indexed
//! columns; loads decode and fail closed on corruption. Every query filters
//! by `tenant_id` explicitly, the stand-in for row-level security in the
//! out-of-scope Postgres deployment. `create_with_audit` demonstrates the
//! mutation-atomic contract: the entity insert and the audit insert share one
//! transaction, and a failure of either rolls both back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use idis_core::core::audit::AuditEvent;
use idis_core::core::claim::Claim;
use idis_core::core::deal::Deal;
use idis_core::core::identifiers::ActorId;
use idis_core::core::identifiers::ClaimId;
use idis_core::core::identifiers::DealId;
use idis_core::core::identifiers::RunId;
use idis_core::core::identifiers::TenantId;
use idis_core::core::run::Run;
use idis_core::core::run::RunStep;
use idis_core::core::run::StepName;
use idis_core::interfaces::AuditSink;
use idis_core::interfaces::AuditSinkError;
use idis_core::interfaces::ClaimDealResolver;
use idis_core::interfaces::ClaimRepository;
use idis_core::interfaces::DealAssignmentStore;
use idis_core::interfaces::DealRepository;
use idis_core::interfaces::RepoError;
use idis_core::interfaces::ResolutionError;
use idis_core::interfaces::RunRepository;
use idis_core::interfaces::RunStepRepository;
use idis_core::validators::audit_event::validate_audit_event;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Store schema version.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Sync mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config with defaults for a path.
    #[must_use]
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Snapshot decoding failure.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Audit event rejected before or during the shared transaction.
    #[error("sqlite audit emission failed: {0}")]
    AuditRejected(String),
}

impl From<SqliteStoreError> for RepoError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::Db(message)
            | SqliteStoreError::VersionMismatch(message)
            | SqliteStoreError::AuditRejected(message) => Self::Storage(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed store implementing the IDIS repository interfaces.
#[derive(Clone)]
pub struct SqliteStore {
    /// Shared connection guarded for exclusive statements.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens the store, creating and migrating the schema when needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// the stored schema version is incompatible.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = Connection::open(&config.path)?;
        connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        connection.pragma_update(None, "journal_mode", "wal")?;
        connection.pragma_update(None, "synchronous", config.sync_mode.pragma_value())?;
        connection.pragma_update(None, "foreign_keys", "on")?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store for tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when initialization fails.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory()?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs a closure over the locked connection.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))?;
        f(&mut guard)
    }

    /// Persists a deal and its audit event in one transaction.
    ///
    /// This is the mutation-atomic contract of the audit pipeline: the deal
    /// insert and the audit insert commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::AuditRejected`] when event validation or
    /// the audit insert fails; the deal insert is rolled back.
    pub fn create_deal_with_audit(
        &self,
        deal: &Deal,
        event: &AuditEvent,
    ) -> Result<(), SqliteStoreError> {
        let validation = validate_audit_event(event);
        if !validation.passed {
            return Err(SqliteStoreError::AuditRejected(format!(
                "audit event validation failed: {}",
                validation.error_codes().join(", ")
            )));
        }
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            insert_deal(&tx, deal)?;
            insert_audit_event(&tx, event)
                .map_err(|err| SqliteStoreError::AuditRejected(err.to_string()))?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Grants a deal assignment.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on statement failure.
    pub fn add_assignment(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        actor_id: &ActorId,
    ) -> Result<(), SqliteStoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO deal_assignments (tenant_id, deal_id, actor_id)
                 VALUES (?1, ?2, ?3)",
                params![tenant_id.as_str(), deal_id.as_str(), actor_id.as_str()],
            )?;
            Ok(())
        })
    }

    /// Lists audit events for a tenant in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on statement or decode failure.
    pub fn list_audit_events(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<AuditEvent>, SqliteStoreError> {
        self.with_conn(|conn| {
            let mut statement = conn.prepare(
                "SELECT event_json FROM audit_events WHERE tenant_id = ?1 ORDER BY seq",
            )?;
            let rows = statement.query_map(params![tenant_id.as_str()], |row| {
                row.get::<_, String>(0)
            })?;
            let mut events = Vec::new();
            for row in rows {
                let raw = row?;
                let event: AuditEvent = serde_json::from_str(&raw)
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
                events.push(event);
            }
            Ok(events)
        })
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Creates tables and checks the schema version.
fn initialize_schema(conn: &Connection) -> Result<(), SqliteStoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (
             id INTEGER PRIMARY KEY CHECK (id = 1),
             version INTEGER NOT NULL
         );
         CREATE TABLE IF NOT EXISTS deals (
             deal_id TEXT PRIMARY KEY,
             tenant_id TEXT NOT NULL,
             created_at TEXT NOT NULL,
             deal_json TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_deals_tenant ON deals (tenant_id, created_at);
         CREATE TABLE IF NOT EXISTS claims (
             claim_id TEXT PRIMARY KEY,
             tenant_id TEXT NOT NULL,
             deal_id TEXT NOT NULL,
             created_at TEXT NOT NULL,
             claim_json TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_claims_tenant_deal ON claims (tenant_id, deal_id);
         CREATE TABLE IF NOT EXISTS runs (
             run_id TEXT PRIMARY KEY,
             tenant_id TEXT NOT NULL,
             deal_id TEXT NOT NULL,
             run_json TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS run_steps (
             step_id TEXT PRIMARY KEY,
             tenant_id TEXT NOT NULL,
             run_id TEXT NOT NULL,
             step_name TEXT NOT NULL,
             step_order INTEGER NOT NULL,
             step_json TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_run_steps_run ON run_steps (tenant_id, run_id, step_order);
         CREATE TABLE IF NOT EXISTS deal_assignments (
             tenant_id TEXT NOT NULL,
             deal_id TEXT NOT NULL,
             actor_id TEXT NOT NULL,
             PRIMARY KEY (tenant_id, deal_id, actor_id)
         );
         CREATE TABLE IF NOT EXISTS audit_events (
             seq INTEGER PRIMARY KEY AUTOINCREMENT,
             event_id TEXT NOT NULL UNIQUE,
             tenant_id TEXT NOT NULL,
             event_type TEXT NOT NULL,
             event_json TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_audit_tenant ON audit_events (tenant_id, seq);",
    )?;

    let version: Option<i64> = conn
        .query_row("SELECT version FROM schema_meta WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            conn.execute(
                "INSERT INTO schema_meta (id, version) VALUES (1, ?1)",
                params![SCHEMA_VERSION],
            )?;
            Ok(())
        }
        Some(found) if found == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteStoreError::VersionMismatch(format!(
            "found schema version {found}, expected {SCHEMA_VERSION}"
        ))),
    }
}

// ============================================================================
// SECTION: Row Helpers
// ============================================================================

/// Inserts a deal row inside a transaction.
fn insert_deal(conn: &Connection, deal: &Deal) -> Result<(), SqliteStoreError> {
    let snapshot = serde_json::to_string(deal)
        .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    conn.execute(
        "INSERT OR REPLACE INTO deals (deal_id, tenant_id, created_at, deal_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            deal.deal_id.as_str(),
            deal.tenant_id.as_str(),
            deal.created_at.to_string(),
            snapshot
        ],
    )?;
    Ok(())
}

/// Inserts an audit event row inside a transaction.
fn insert_audit_event(conn: &Connection, event: &AuditEvent) -> Result<(), SqliteStoreError> {
    let snapshot = serde_json::to_string(event)
        .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    conn.execute(
        "INSERT INTO audit_events (event_id, tenant_id, event_type, event_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            event.event_id.as_str(),
            event.tenant_id.as_str(),
            event.event_type,
            snapshot
        ],
    )?;
    Ok(())
}

/// Decodes a JSON snapshot column.
fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, SqliteStoreError> {
    serde_json::from_str(raw).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

// ============================================================================
// SECTION: Repository Implementations
// ============================================================================

impl DealRepository for SqliteStore {
    fn create(&self, deal: &Deal) -> Result<(), RepoError> {
        self.with_conn(|conn| insert_deal(conn, deal)).map_err(RepoError::from)
    }

    fn get(&self, tenant_id: &TenantId, deal_id: &DealId) -> Result<Option<Deal>, RepoError> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT deal_json FROM deals WHERE deal_id = ?1 AND tenant_id = ?2",
                    params![deal_id.as_str(), tenant_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|snapshot| decode(&snapshot)).transpose()
        })
        .map_err(RepoError::from)
    }

    fn update(&self, deal: &Deal) -> Result<(), RepoError> {
        let updated = self
            .with_conn(|conn| {
                let snapshot = serde_json::to_string(deal)
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
                let count = conn.execute(
                    "UPDATE deals SET deal_json = ?1 WHERE deal_id = ?2 AND tenant_id = ?3",
                    params![snapshot, deal.deal_id.as_str(), deal.tenant_id.as_str()],
                )?;
                Ok(count)
            })
            .map_err(RepoError::from)?;
        if updated == 0 {
            return Err(RepoError::NotFound(deal.deal_id.to_string()));
        }
        Ok(())
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<Deal>, RepoError> {
        self.with_conn(|conn| {
            let mut statement = conn.prepare(
                "SELECT deal_json FROM deals WHERE tenant_id = ?1 ORDER BY created_at, deal_id",
            )?;
            let rows = statement
                .query_map(params![tenant_id.as_str()], |row| row.get::<_, String>(0))?;
            let mut deals = Vec::new();
            for row in rows {
                deals.push(decode(&row?)?);
            }
            Ok(deals)
        })
        .map_err(RepoError::from)
    }
}

impl ClaimRepository for SqliteStore {
    fn create(&self, claim: &Claim) -> Result<(), RepoError> {
        self.with_conn(|conn| {
            let snapshot = serde_json::to_string(claim)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            conn.execute(
                "INSERT OR REPLACE INTO claims
                     (claim_id, tenant_id, deal_id, created_at, claim_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    claim.claim_id.as_str(),
                    claim.tenant_id.as_str(),
                    claim.deal_id.as_str(),
                    claim.created_at.to_string(),
                    snapshot
                ],
            )?;
            Ok(())
        })
        .map_err(RepoError::from)
    }

    fn get(&self, tenant_id: &TenantId, claim_id: &ClaimId) -> Result<Option<Claim>, RepoError> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT claim_json FROM claims WHERE claim_id = ?1 AND tenant_id = ?2",
                    params![claim_id.as_str(), tenant_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|snapshot| decode(&snapshot)).transpose()
        })
        .map_err(RepoError::from)
    }

    fn update(&self, claim: &Claim) -> Result<(), RepoError> {
        let updated = self
            .with_conn(|conn| {
                let snapshot = serde_json::to_string(claim)
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
                let count = conn.execute(
                    "UPDATE claims SET claim_json = ?1 WHERE claim_id = ?2 AND tenant_id = ?3",
                    params![snapshot, claim.claim_id.as_str(), claim.tenant_id.as_str()],
                )?;
                Ok(count)
            })
            .map_err(RepoError::from)?;
        if updated == 0 {
            return Err(RepoError::NotFound(claim.claim_id.to_string()));
        }
        Ok(())
    }

    fn list_for_deal(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
    ) -> Result<Vec<Claim>, RepoError> {
        self.with_conn(|conn| {
            let mut statement = conn.prepare(
                "SELECT claim_json FROM claims
                 WHERE tenant_id = ?1 AND deal_id = ?2
                 ORDER BY created_at, claim_id",
            )?;
            let rows = statement.query_map(
                params![tenant_id.as_str(), deal_id.as_str()],
                |row| row.get::<_, String>(0),
            )?;
            let mut claims = Vec::new();
            for row in rows {
                claims.push(decode(&row?)?);
            }
            Ok(claims)
        })
        .map_err(RepoError::from)
    }
}

impl RunRepository for SqliteStore {
    fn create(&self, run: &Run) -> Result<(), RepoError> {
        self.with_conn(|conn| {
            let snapshot = serde_json::to_string(run)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            conn.execute(
                "INSERT OR REPLACE INTO runs (run_id, tenant_id, deal_id, run_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run.run_id.as_str(),
                    run.tenant_id.as_str(),
                    run.deal_id.as_str(),
                    snapshot
                ],
            )?;
            Ok(())
        })
        .map_err(RepoError::from)
    }

    fn get(&self, tenant_id: &TenantId, run_id: &RunId) -> Result<Option<Run>, RepoError> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT run_json FROM runs WHERE run_id = ?1 AND tenant_id = ?2",
                    params![run_id.as_str(), tenant_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|snapshot| decode(&snapshot)).transpose()
        })
        .map_err(RepoError::from)
    }

    fn update(&self, run: &Run) -> Result<(), RepoError> {
        let updated = self
            .with_conn(|conn| {
                let snapshot = serde_json::to_string(run)
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
                let count = conn.execute(
                    "UPDATE runs SET run_json = ?1 WHERE run_id = ?2 AND tenant_id = ?3",
                    params![snapshot, run.run_id.as_str(), run.tenant_id.as_str()],
                )?;
                Ok(count)
            })
            .map_err(RepoError::from)?;
        if updated == 0 {
            return Err(RepoError::NotFound(run.run_id.to_string()));
        }
        Ok(())
    }
}

impl RunStepRepository for SqliteStore {
    fn create(&self, step: &RunStep) -> Result<(), RepoError> {
        self.with_conn(|conn| {
            let snapshot = serde_json::to_string(step)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            conn.execute(
                "INSERT INTO run_steps
                     (step_id, tenant_id, run_id, step_name, step_order, step_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    step.step_id.as_str(),
                    step.tenant_id.as_str(),
                    step.run_id.as_str(),
                    step_name_label(step.step_name),
                    step.step_order,
                    snapshot
                ],
            )?;
            Ok(())
        })
        .map_err(RepoError::from)
    }

    fn update(&self, step: &RunStep) -> Result<(), RepoError> {
        let updated = self
            .with_conn(|conn| {
                let snapshot = serde_json::to_string(step)
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
                let count = conn.execute(
                    "UPDATE run_steps SET step_json = ?1
                     WHERE step_id = ?2 AND tenant_id = ?3",
                    params![snapshot, step.step_id.as_str(), step.tenant_id.as_str()],
                )?;
                Ok(count)
            })
            .map_err(RepoError::from)?;
        if updated == 0 {
            return Err(RepoError::NotFound(step.step_id.to_string()));
        }
        Ok(())
    }

    fn steps_for_run(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
    ) -> Result<Vec<RunStep>, RepoError> {
        self.with_conn(|conn| {
            let mut statement = conn.prepare(
                "SELECT step_json FROM run_steps
                 WHERE tenant_id = ?1 AND run_id = ?2
                 ORDER BY step_order",
            )?;
            let rows = statement.query_map(
                params![tenant_id.as_str(), run_id.as_str()],
                |row| row.get::<_, String>(0),
            )?;
            let mut steps = Vec::new();
            for row in rows {
                steps.push(decode(&row?)?);
            }
            Ok(steps)
        })
        .map_err(RepoError::from)
    }

    fn get_step(
        &self,
        tenant_id: &TenantId,
        run_id: &RunId,
        step_name: StepName,
    ) -> Result<Option<RunStep>, RepoError> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT step_json FROM run_steps
                     WHERE tenant_id = ?1 AND run_id = ?2 AND step_name = ?3",
                    params![tenant_id.as_str(), run_id.as_str(), step_name_label(step_name)],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|snapshot| decode(&snapshot)).transpose()
        })
        .map_err(RepoError::from)
    }
}

impl DealAssignmentStore for SqliteStore {
    fn is_actor_assigned(
        &self,
        tenant_id: &TenantId,
        deal_id: &DealId,
        actor_id: &ActorId,
    ) -> bool {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM deal_assignments
                     WHERE tenant_id = ?1 AND deal_id = ?2 AND actor_id = ?3",
                    params![tenant_id.as_str(), deal_id.as_str(), actor_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .unwrap_or(false)
    }

    fn is_actor_in_deal_group(
        &self,
        _tenant_id: &TenantId,
        _deal_id: &DealId,
        _actor_id: &ActorId,
    ) -> bool {
        // Group membership is resolved by the directory integration, which
        // is out of scope here; the durable store only records direct
        // assignments.
        false
    }
}

impl ClaimDealResolver for SqliteStore {
    fn resolve_deal_id_for_claim(
        &self,
        tenant_id: &TenantId,
        claim_id: &ClaimId,
    ) -> Result<Option<DealId>, ResolutionError> {
        self.with_conn(|conn| {
            let deal: Option<String> = conn
                .query_row(
                    "SELECT deal_id FROM claims WHERE claim_id = ?1 AND tenant_id = ?2",
                    params![claim_id.as_str(), tenant_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(deal.map(DealId::new))
        })
        .map_err(|_| ResolutionError::Unavailable)
    }
}

impl AuditSink for SqliteStore {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            insert_audit_event(&tx, event)?;
            tx.commit()?;
            Ok(())
        })
        .map_err(|err| AuditSinkError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the canonical wire label of a step name.
const fn step_name_label(name: StepName) -> &'static str {
    match name {
        StepName::IngestCheck => "INGEST_CHECK",
        StepName::Extract => "EXTRACT",
        StepName::Grade => "GRADE",
        StepName::Calc => "CALC",
        StepName::Enrichment => "ENRICHMENT",
        StepName::Debate => "DEBATE",
        StepName::Analysis => "ANALYSIS",
        StepName::Scoring => "SCORING",
        StepName::Deliverables => "DELIVERABLES",
    }
}
