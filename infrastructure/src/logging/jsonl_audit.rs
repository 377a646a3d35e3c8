//! JSONL audit trail.
//!
//! Each [`AuditEntry`] is serialized as a single JSON line and appended to
//! the file. The file is opened in append mode, so entries from earlier
//! sessions are kept.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use steward_application::{AuditEntry, AuditLogger};
use tracing::warn;

/// Audit logger that appends one JSON object per executed command.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every entry and
/// on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the audit file at `path`.
    ///
    /// Creates parent directories as needed. Returns `None` if the file
    /// cannot be opened; the caller decides whether to continue unaudited.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Could not serialize audit entry");
                return;
            }
        };

        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!(path = %self.path.display(), error = %e, "Audit write failed");
            }
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use steward_domain::{
        Command, ExecutionPhase, ExecutionResult, RiskLevel, ToolName, ToolRunOutcome,
        ToolRunRecord,
    };

    fn entry(utterance: &str, success: bool) -> AuditEntry {
        let tool = ToolName::new("install_package").unwrap();
        let command = Command {
            intent: "install_package".into(),
            tools: vec![tool.clone()],
            params: BTreeMap::new(),
            confirmation_required: true,
            description: "Install nginx".into(),
            risk_level: RiskLevel::Moderate,
            missing: Vec::new(),
            confidence: 0.75,
            utterance: utterance.into(),
        };
        let outcome = if success {
            ToolRunOutcome::Succeeded {
                output: "done".into(),
            }
        } else {
            ToolRunOutcome::Failed {
                message: "exit 100".into(),
            }
        };
        let result = ExecutionResult {
            success,
            output: "done".into(),
            error: None,
            per_tool_results: vec![ToolRunRecord::new(tool, outcome)],
            plan: None,
            final_phase: if success {
                ExecutionPhase::Succeeded
            } else {
                ExecutionPhase::Failed
            },
        };
        AuditEntry::new(utterance, command, true, result)
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.record(&entry("install nginx", true));
        logger.record(&entry("install nginxx", false));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["utterance"], "install nginx");
        assert_eq!(lines[0]["confirmed"], true);
        assert_eq!(lines[0]["command"]["tools"][0], "install_package");
        assert_eq!(lines[1]["result"]["success"], false);
        assert!(lines[1]["timestamp"].is_string());
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");

        JsonlAuditLogger::new(&path)
            .unwrap()
            .record(&entry("install nginx", true));
        JsonlAuditLogger::new(&path)
            .unwrap()
            .record(&entry("install redis", true));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["utterance"], "install redis");
    }

    #[test]
    fn test_unwritable_path_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();
        assert!(JsonlAuditLogger::new(blocker.join("audit.jsonl")).is_none());
    }
}
