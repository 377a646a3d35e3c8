//! Audit and log file configuration (`[audit]` and `[logging]` sections)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    pub enabled: bool,
    /// Audit file; `~` expands to the home directory.
    /// Defaults to `<data dir>/steward/audit.jsonl`.
    pub path: Option<String>,
}

impl Default for FileAuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl FileAuditConfig {
    /// Resolved audit file location
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(expand_home(path)),
            None => dirs::data_dir().map(|d| d.join("steward").join("audit.jsonl")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily-rotated log files; unset logs to stderr only
    pub dir: Option<String>,
}

impl FileLoggingConfig {
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/log/steward"), PathBuf::from("/var/log/steward"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/audit.jsonl"), home.join("audit.jsonl"));
        }
    }

    #[test]
    fn test_explicit_audit_path_wins() {
        let config = FileAuditConfig {
            enabled: true,
            path: Some("/tmp/steward-audit.jsonl".into()),
        };
        assert_eq!(
            config.resolved_path(),
            Some(PathBuf::from("/tmp/steward-audit.jsonl"))
        );
    }
}
