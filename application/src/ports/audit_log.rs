//! Port for the command audit trail.
//!
//! Defines the [`AuditLogger`] trait for recording one entry per executed
//! command: what was asked, what it was routed to, whether a human
//! confirmed it, and how it ended.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures a machine-readable
//! record (JSONL) an operator can review later.

use chrono::{DateTime, Utc};
use serde::Serialize;
use steward_domain::{Command, ExecutionResult};

/// One audited command
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// When the command finished
    pub timestamp: DateTime<Utc>,
    /// The utterance as typed by the operator
    pub utterance: String,
    /// The routed command
    pub command: Command,
    /// Whether the operator explicitly approved the command
    pub confirmed: bool,
    /// Final result
    pub result: ExecutionResult,
}

impl AuditEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn new(
        utterance: impl Into<String>,
        command: Command,
        confirmed: bool,
        result: ExecutionResult,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            utterance: utterance.into(),
            command,
            confirmed,
            result,
        }
    }
}

/// Port for writing audit entries.
///
/// `record` is synchronous and non-fallible; a broken audit sink must not
/// change the outcome of a command that already ran.
pub trait AuditLogger: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn record(&self, _entry: &AuditEntry) {}
}
