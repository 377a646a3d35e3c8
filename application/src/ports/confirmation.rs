//! Confirmation port for gating risky commands on a human decision.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ConfirmationPort`] - defined here in application layer
//! - **Adapter**: `ConsoleConfirmation` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! Command (risk = moderate | destructive)
//!        ↓
//! Dry run → ExecutionPlan
//!        ↓
//! ConfirmationPort::confirm(description, risk, plan)
//!        ↓
//! true  → Executing
//! false → Cancelled (ConfirmationDeclined)
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoDecline`] - Always declines
//! - [`AutoApprove`] - Always approves (`--yes`)
//! - [`FnConfirmation`] - Wraps a closure, mostly for tests

use std::sync::Mutex;

use async_trait::async_trait;
use steward_domain::{ExecutionPlan, RiskLevel, ToolName};
use thiserror::Error;

/// Error type for confirmation operations.
///
/// These errors represent failures while asking, not the operator's answer.
/// The executor treats every error as a decline.
#[derive(Debug, Clone, Error)]
pub enum ConfirmationError {
    /// Operator interrupted the prompt (e.g., via Ctrl+C)
    #[error("Confirmation interrupted")]
    Interrupted,
    /// Input/output error (e.g., terminal read failure)
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Everything the operator sees before deciding
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationRequest<'a> {
    /// One-sentence command summary
    pub description: &'a str,
    /// Risk re-derived from the live catalog
    pub risk_level: RiskLevel,
    /// Tools in execution order
    pub tools: &'a [ToolName],
    /// Dry-run projection of what will happen
    pub plan: &'a ExecutionPlan,
}

/// Port for asking a human to approve a command.
///
/// Called at most once per command, only after the dry run has produced a
/// plan and only when the command needs confirmation.
#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// Returns `Ok(true)` to proceed, `Ok(false)` to cancel.
    async fn confirm(&self, request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError>;
}

/// Declines every command
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

#[async_trait]
impl ConfirmationPort for AutoDecline {
    async fn confirm(&self, _request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError> {
        Ok(false)
    }
}

/// Approves every command
///
/// Use only for non-interactive runs the operator explicitly opted into.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationPort for AutoApprove {
    async fn confirm(&self, _request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError> {
        Ok(true)
    }
}

/// Confirmation backed by a synchronous closure
pub struct FnConfirmation<F>
where
    F: Fn(&ConfirmationRequest<'_>) -> bool + Send + Sync,
{
    decide: F,
}

impl<F> FnConfirmation<F>
where
    F: Fn(&ConfirmationRequest<'_>) -> bool + Send + Sync,
{
    pub fn new(decide: F) -> Self {
        Self { decide }
    }
}

#[async_trait]
impl<F> ConfirmationPort for FnConfirmation<F>
where
    F: Fn(&ConfirmationRequest<'_>) -> bool + Send + Sync,
{
    async fn confirm(&self, request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError> {
        Ok((self.decide)(request))
    }
}

/// Wraps another port and remembers the decision it returned
pub struct RecordingConfirmation<'a> {
    inner: &'a dyn ConfirmationPort,
    decision: Mutex<Option<bool>>,
}

impl<'a> RecordingConfirmation<'a> {
    pub fn new(inner: &'a dyn ConfirmationPort) -> Self {
        Self {
            inner,
            decision: Mutex::new(None),
        }
    }

    /// `None` if the executor never asked
    pub fn decision(&self) -> Option<bool> {
        self.decision.lock().ok().and_then(|d| *d)
    }
}

#[async_trait]
impl ConfirmationPort for RecordingConfirmation<'_> {
    async fn confirm(&self, request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError> {
        let result = self.inner.confirm(request).await;
        if let Ok(mut slot) = self.decision.lock() {
            *slot = Some(matches!(result, Ok(true)));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(plan: &'a ExecutionPlan, tools: &'a [ToolName]) -> ConfirmationRequest<'a> {
        ConfirmationRequest {
            description: "Install nginx",
            risk_level: RiskLevel::Moderate,
            tools,
            plan,
        }
    }

    #[tokio::test]
    async fn test_auto_ports() {
        let plan = ExecutionPlan::default();
        let req = request(&plan, &[]);
        assert!(AutoApprove.confirm(&req).await.unwrap());
        assert!(!AutoDecline.confirm(&req).await.unwrap());
    }

    #[tokio::test]
    async fn test_fn_confirmation_sees_risk() {
        let port = FnConfirmation::new(|req| req.risk_level != RiskLevel::Destructive);
        let plan = ExecutionPlan::default();
        assert!(port.confirm(&request(&plan, &[])).await.unwrap());
    }

    #[tokio::test]
    async fn test_recording_confirmation() {
        let plan = ExecutionPlan::default();
        let recorder = RecordingConfirmation::new(&AutoDecline);
        assert_eq!(recorder.decision(), None);
        recorder.confirm(&request(&plan, &[])).await.unwrap();
        assert_eq!(recorder.decision(), Some(false));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfirmationError::IoError("closed".into()).to_string(),
            "I/O error: closed"
        );
    }
}
