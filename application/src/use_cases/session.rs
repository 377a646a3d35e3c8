//! Assistant session facade
//!
//! Pairs a [`Router`] with a [`SafetyExecutor`] and enforces the session
//! rules the presentation layer relies on:
//!
//! - one command executes at a time; a second `execute` waits for the first
//! - a request takes its cancellation token when it arrives, so
//!   [`AssistantSession::cancel`] reaches requests that are still routing or
//!   waiting their turn, and never reaches requests made after it
//! - every executed command produces one audit entry

use std::sync::{Arc, Mutex, PoisonError};

use steward_domain::{Command, ExecutionPlan, ExecutionResult, ToolCatalog};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::PipelineError;
use super::execute_command::SafetyExecutor;
use super::route_command::Router;
use crate::ports::audit_log::{AuditEntry, AuditLogger, NoAuditLogger};
use crate::ports::confirmation::{ConfirmationPort, RecordingConfirmation};
use crate::ports::execution_progress::{ExecutionProgress, NoProgress};
use crate::registry::ToolRegistry;

pub struct AssistantSession {
    router: Router,
    executor: SafetyExecutor,
    audit: Arc<dyn AuditLogger>,
    active: tokio::sync::Mutex<()>,
    cancel: Mutex<CancellationToken>,
}

impl AssistantSession {
    pub fn new(router: Router, executor: SafetyExecutor) -> Self {
        Self {
            router,
            executor,
            audit: Arc::new(NoAuditLogger),
            active: tokio::sync::Mutex::new(()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.executor.registry()
    }

    pub fn resolver_name(&self) -> &str {
        self.router.resolver_name()
    }

    /// Current catalog, as the router sees it
    pub fn catalog(&self) -> ToolCatalog {
        self.registry().snapshot()
    }

    /// Whether a command is executing right now
    pub fn is_busy(&self) -> bool {
        self.active.try_lock().is_err()
    }

    pub async fn route(&self, utterance: &str) -> Result<Command, PipelineError> {
        self.router.route(utterance, &self.catalog()).await
    }

    pub async fn plan_dry_run(&self, command: &Command) -> Result<ExecutionPlan, PipelineError> {
        self.executor.plan_dry_run(command).await
    }

    pub async fn execute(
        &self,
        command: &Command,
        confirm: &dyn ConfirmationPort,
    ) -> ExecutionResult {
        self.execute_with(command, confirm, &NoProgress).await
    }

    pub async fn execute_with(
        &self,
        command: &Command,
        confirm: &dyn ConfirmationPort,
        progress: &dyn ExecutionProgress,
    ) -> ExecutionResult {
        let token = self.current_token();
        self.run(&command.utterance, command, confirm, progress, &token)
            .await
    }

    /// Route and execute one utterance.
    ///
    /// Routing failures are returned as errors and are not audited; there is
    /// no command to record yet.
    pub async fn handle(
        &self,
        utterance: &str,
        confirm: &dyn ConfirmationPort,
        progress: &dyn ExecutionProgress,
    ) -> Result<(Command, ExecutionResult), PipelineError> {
        let token = self.current_token();
        let command = self.route(utterance).await?;
        let result = self
            .run(utterance, &command, confirm, progress, &token)
            .await;
        Ok((command, result))
    }

    /// Cancel every request made so far, whether it is routing, waiting for
    /// its turn or executing.
    ///
    /// A tool that is already running finishes; nothing after it starts.
    pub fn cancel(&self) {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        slot.cancel();
        *slot = CancellationToken::new();
    }

    async fn run(
        &self,
        utterance: &str,
        command: &Command,
        confirm: &dyn ConfirmationPort,
        progress: &dyn ExecutionProgress,
        token: &CancellationToken,
    ) -> ExecutionResult {
        let _turn = self.active.lock().await;

        let recording = RecordingConfirmation::new(confirm);
        let result = self
            .executor
            .execute_with(command, &recording, progress, token)
            .await;

        let confirmed = recording.decision().unwrap_or(false);
        debug!(intent = %command.intent, confirmed, "Recording audit entry");
        self.audit.record(&AuditEntry::new(
            utterance,
            command.clone(),
            confirmed,
            result.clone(),
        ));
        result
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
