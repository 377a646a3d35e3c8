//! Execution result value objects
//!
//! An [`ExecutionResult`] is produced exactly once per command and carries
//! one [`ToolRunRecord`] per command tool, in command order, even when the
//! run stopped early. Tools that never ran get an explicit
//! [`ToolRunOutcome::Skipped`] so an operator can always tell which tools
//! completed.

use serde::{Deserialize, Serialize};

use super::phase::ExecutionPhase;
use super::plan::ExecutionPlan;
use crate::tool::ToolName;

/// Classified failure kinds of the routing and execution pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No tool matched the utterance
    UnresolvedIntent,
    /// Arguments violate the tool schema
    InvalidParameter,
    /// The registry changed between routing and execution
    StaleToolReference,
    /// A tool did not answer within its time budget
    ToolTimeout,
    /// The backend reported an error
    ToolExecution,
    /// The operator declined confirmation (a normal cancellation path)
    ConfirmationDeclined,
    /// The session was cancelled between tool invocations
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::UnresolvedIntent => "unresolved_intent",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::StaleToolReference => "stale_tool_reference",
            ErrorKind::ToolTimeout => "tool_timeout",
            ErrorKind::ToolExecution => "tool_execution",
            ErrorKind::ConfirmationDeclined => "confirmation_declined",
            ErrorKind::Cancelled => "cancelled",
        }
    }

    /// Whether the kind represents a deliberate stop rather than a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ErrorKind::ConfirmationDeclined | ErrorKind::Cancelled)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<ToolName>,
    pub recoverable: bool,
}

/// Why a tool did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// An earlier tool in the command failed
    #[serde(rename = "skipped-due-to-prior-failure")]
    PriorFailure,
    /// Confirmation was declined
    NotConfirmed,
    /// The session was cancelled
    Cancelled,
    /// The command was rejected before execution began
    Aborted,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::PriorFailure => "skipped-due-to-prior-failure",
            SkipReason::NotConfirmed => "not-confirmed",
            SkipReason::Cancelled => "cancelled",
            SkipReason::Aborted => "aborted",
        }
    }
}

/// Outcome of one tool within a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolRunOutcome {
    Succeeded { output: String },
    Failed { message: String },
    TimedOut { after_ms: u64 },
    Skipped { reason: SkipReason },
}

impl ToolRunOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        ToolRunOutcome::Skipped { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolRunOutcome::Succeeded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ToolRunOutcome::Skipped { .. })
    }

    /// Whether the tool was actually invoked in execute mode
    pub fn ran(&self) -> bool {
        !self.is_skipped()
    }
}

/// Per-tool record inside an [`ExecutionResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRunRecord {
    pub tool: ToolName,
    pub outcome: ToolRunOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolRunRecord {
    pub fn new(tool: ToolName, outcome: ToolRunOutcome) -> Self {
        Self {
            tool,
            outcome,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Normalized result of executing one command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub per_tool_results: Vec<ToolRunRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
    pub final_phase: ExecutionPhase,
}

impl ExecutionResult {
    /// Tools that completed successfully, in order
    pub fn completed_tools(&self) -> Vec<&ToolName> {
        self.per_tool_results
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| &r.tool)
            .collect()
    }

    /// Whether this result is a deliberate stop (declined or cancelled)
    pub fn was_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.kind.is_cancellation())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ToolName {
        ToolName::new(s).unwrap()
    }

    #[test]
    fn test_skip_reason_wire_name() {
        let outcome = ToolRunOutcome::skipped(SkipReason::PriorFailure);
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire["status"], "skipped");
        assert_eq!(wire["reason"], "skipped-due-to-prior-failure");
        assert_eq!(SkipReason::PriorFailure.as_str(), "skipped-due-to-prior-failure");
    }

    #[test]
    fn test_completed_tools() {
        let result = ExecutionResult {
            success: false,
            output: String::new(),
            error: Some(ErrorInfo {
                kind: ErrorKind::ToolExecution,
                message: "boom".into(),
                tool_name: Some(name("b")),
                recoverable: false,
            }),
            per_tool_results: vec![
                ToolRunRecord::new(name("a"), ToolRunOutcome::Succeeded { output: "ok".into() }),
                ToolRunRecord::new(name("b"), ToolRunOutcome::Failed { message: "boom".into() }),
                ToolRunRecord::new(name("c"), ToolRunOutcome::skipped(SkipReason::PriorFailure)),
            ],
            plan: None,
            final_phase: ExecutionPhase::Failed,
        };

        assert_eq!(result.completed_tools(), vec![&name("a")]);
        assert!(!result.was_cancelled());
        assert_eq!(result.error_kind(), Some(ErrorKind::ToolExecution));
        assert!(result.per_tool_results[1].outcome.ran());
        assert!(!result.per_tool_results[2].outcome.ran());
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(ErrorKind::ConfirmationDeclined.is_cancellation());
        assert!(ErrorKind::Cancelled.is_cancellation());
        assert!(!ErrorKind::ToolTimeout.is_cancellation());
    }
}
