// idis-core/src/audit/sink.rs
// ============================================================================
// Module: IDIS Audit Sinks
// Description: Append-only JSON-lines and in-memory audit sinks.
// Purpose: Durable, fsync-per-event emission shared by every mutation path.
// Dependencies: crate::{core, interfaces}, serde_jcs
// ============================================================================

//! ## Overview
//! The JSONL sink writes one canonical-JSON event per line, UTF-8 with a
//! trailing newline, and fsyncs before returning success: an event is either
//! on disk or the mutation that produced it is aborted. The in-memory sink
//! backs tests and local development. The transactional database sink lives
//! in the store crate so it can join the mutation's transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::audit::AuditEvent;
use crate::core::hashing::canonical_json_bytes;
use crate::interfaces::AuditSink;
use crate::interfaces::AuditSinkError;

// ============================================================================
// SECTION: JSONL File Sink
// ============================================================================

/// Append-only JSON-lines audit sink with per-event fsync.
#[derive(Clone)]
pub struct JsonlFileAuditSink {
    /// Log file path.
    path: PathBuf,
    /// Open append handle guarded for exclusive writes.
    handle: Arc<Mutex<File>>,
}

impl JsonlFileAuditSink {
    /// Opens (or creates) the audit log at `path` in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError::Io`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditSinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| AuditSinkError::Io(err.to_string()))?;
        Ok(Self {
            path,
            handle: Arc::new(Mutex::new(file)),
        })
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlFileAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        let mut line = canonical_json_bytes(event)
            .map_err(|err| AuditSinkError::Encoding(err.to_string()))?;
        line.push(b'\n');

        let mut guard = self
            .handle
            .lock()
            .map_err(|_| AuditSinkError::Io("audit sink mutex poisoned".to_string()))?;
        guard.write_all(&line).map_err(|err| AuditSinkError::Io(err.to_string()))?;
        guard.sync_all().map_err(|err| AuditSinkError::Io(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Sink
// ============================================================================

/// In-memory audit sink for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditSink {
    /// Accepted events in emission order.
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all accepted events in order.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns the events whose type matches a prefix.
    #[must_use]
    pub fn events_with_prefix(&self, prefix: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.event_type.starts_with(prefix))
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        self.events
            .lock()
            .map_err(|_| AuditSinkError::Io("audit sink mutex poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
