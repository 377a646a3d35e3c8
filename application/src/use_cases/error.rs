//! Pipeline error taxonomy shared by routing and execution.
//!
//! Routing failures are returned as `Err(PipelineError)`. Execution failures
//! never escape the executor as errors; they are folded into an
//! [`ExecutionResult`](steward_domain::ExecutionResult) through
//! [`PipelineError::to_info`].

use steward_domain::{ErrorInfo, ErrorKind, ToolName};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Could not understand the request: {message}")]
    UnresolvedIntent {
        message: String,
        suggestions: Vec<String>,
    },

    #[error("Invalid parameters: {message}")]
    InvalidParameter {
        tool: Option<ToolName>,
        message: String,
        /// `tool.param` entries for required parameters with no value
        missing: Vec<String>,
    },

    #[error("Tool '{tool}' is no longer registered; route the request again")]
    StaleToolReference { tool: ToolName },

    #[error("Tool '{tool}' timed out after {after_ms} ms")]
    ToolTimeout { tool: ToolName, after_ms: u64 },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: ToolName, message: String },

    #[error("Operation cancelled: confirmation declined")]
    ConfirmationDeclined,

    #[error("Operation cancelled before '{next_tool}' ran")]
    Cancelled { next_tool: ToolName },
}

impl PipelineError {
    pub fn unresolved(message: impl Into<String>) -> Self {
        PipelineError::UnresolvedIntent {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UnresolvedIntent { .. } => ErrorKind::UnresolvedIntent,
            PipelineError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            PipelineError::StaleToolReference { .. } => ErrorKind::StaleToolReference,
            PipelineError::ToolTimeout { .. } => ErrorKind::ToolTimeout,
            PipelineError::ToolExecution { .. } => ErrorKind::ToolExecution,
            PipelineError::ConfirmationDeclined => ErrorKind::ConfirmationDeclined,
            PipelineError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Whether the operator can fix this by rephrasing, re-routing or retrying.
    ///
    /// Timeouts and backend failures are not: the system may be in a
    /// partially changed state that needs a human look first.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PipelineError::ToolTimeout { .. } | PipelineError::ToolExecution { .. }
        )
    }

    pub fn tool(&self) -> Option<&ToolName> {
        match self {
            PipelineError::InvalidParameter { tool, .. } => tool.as_ref(),
            PipelineError::StaleToolReference { tool }
            | PipelineError::ToolTimeout { tool, .. }
            | PipelineError::ToolExecution { tool, .. } => Some(tool),
            PipelineError::Cancelled { next_tool } => Some(next_tool),
            PipelineError::UnresolvedIntent { .. } | PipelineError::ConfirmationDeclined => None,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            PipelineError::UnresolvedIntent { suggestions, .. } => suggestions,
            _ => &[],
        }
    }

    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind(),
            message: self.to_string(),
            tool_name: self.tool().cloned(),
            recoverable: self.is_recoverable(),
        }
    }
}
