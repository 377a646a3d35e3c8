//! Safety Executor use case
//!
//! Runs a routed [`Command`] through the execution state machine:
//!
//! ```text
//! Planned ─▶ DryRun ─▶ [ConfirmPending] ─▶ Executing ─▶ Succeeded | Failed | Cancelled
//! ```
//!
//! - Every tool is re-resolved against the live registry first; a tool that
//!   disappeared since routing fails the command with
//!   [`PipelineError::StaleToolReference`] before anything runs.
//! - Risk is re-derived from the live descriptors. The confirmation gate is
//!   the union of the routed flag and the live assessment, so it can only
//!   tighten between routing and execution.
//! - The dry run happens before confirmation so the operator sees the plan.
//! - Tools run strictly in command order. The first failure stops the run
//!   and every later tool is recorded as skipped.
//! - Cancellation is honored between tool invocations; an in-flight tool
//!   finishes or times out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use steward_domain::{
    Command, ContentItem, ExecutionPhase, ExecutionPlan, ExecutionResult, PhaseTracker, PlanStep,
    RiskClassifier, RiskLevel, SchemaViolation, SkipReason, StepVerification, ToolArguments, ToolDescriptor, ToolMode, ToolName,
    ToolResponse, ToolRunOutcome, ToolRunRecord, tool::missing_required,
};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use crate::config::PipelineConfig;
use crate::ports::confirmation::{ConfirmationPort, ConfirmationRequest};
use crate::ports::execution_progress::{ExecutionProgress, NoProgress};
use crate::ports::telemetry::{NoTelemetry, TelemetrySink};
use crate::registry::{RegistryError, ToolRegistry};
use crate::routing::describe::render_value;

/// Use case for executing commands behind a dry run and confirmation gate
pub struct SafetyExecutor {
    registry: Arc<ToolRegistry>,
    classifier: RiskClassifier,
    tool_timeout: Duration,
    telemetry: Arc<dyn TelemetrySink>,
}

impl SafetyExecutor {
    pub fn new(registry: Arc<ToolRegistry>, config: &PipelineConfig) -> Self {
        Self {
            registry,
            classifier: RiskClassifier,
            tool_timeout: config.tool_timeout,
            telemetry: Arc::new(NoTelemetry),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Project the command without side effects.
    ///
    /// Every call re-resolves the tools and asks the backends again, so two
    /// calls against an unchanged registry return equal plans.
    pub async fn plan_dry_run(&self, command: &Command) -> Result<ExecutionPlan, PipelineError> {
        let live = self.revalidate(command)?;
        self.dry_run(command, &live).await
    }

    /// Execute with default (no-op) progress and no external cancellation
    pub async fn execute(
        &self,
        command: &Command,
        confirm: &dyn ConfirmationPort,
    ) -> ExecutionResult {
        self.execute_with(command, confirm, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Execute with progress callbacks and a cancellation token.
    ///
    /// Never returns an error: every failure is folded into the result.
    pub async fn execute_with(
        &self,
        command: &Command,
        confirm: &dyn ConfirmationPort,
        progress: &dyn ExecutionProgress,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let mut tracker = PhaseTracker::new();
        info!(
            intent = %command.intent,
            risk = command.risk_level.as_str(),
            tools = command.tools.len(),
            "Executing command"
        );

        let live = match self.revalidate(command) {
            Ok(live) => live,
            Err(e) => return self.abort(command, &mut tracker, progress, e),
        };
        let assessment = self.classifier.classify_descriptors(&live);
        let risk_level = assessment.risk_level.max(command.risk_level);
        let confirmation_required =
            command.confirmation_required || assessment.confirmation_required;
        if assessment.risk_level > command.risk_level {
            warn!(
                intent = %command.intent,
                routed = command.risk_level.as_str(),
                live = assessment.risk_level.as_str(),
                "Live risk is higher than the routed risk"
            );
        }

        advance(&mut tracker, ExecutionPhase::DryRun, progress);
        let plan = match self.dry_run(command, &live).await {
            Ok(plan) => plan,
            Err(e) => return self.abort(command, &mut tracker, progress, e),
        };

        if confirmation_required {
            advance(&mut tracker, ExecutionPhase::ConfirmPending, progress);
            let accepted = self
                .ask(command, risk_level, &plan, confirm, cancel)
                .await;
            if !accepted {
                let (error, reason) = if cancel.is_cancelled() {
                    (
                        PipelineError::Cancelled {
                            next_tool: command.tools[0].clone(),
                        },
                        SkipReason::Cancelled,
                    )
                } else {
                    (PipelineError::ConfirmationDeclined, SkipReason::NotConfirmed)
                };
                info!(intent = %command.intent, "Command not confirmed");
                advance(&mut tracker, ExecutionPhase::Cancelled, progress);
                return self.finish(
                    command,
                    ExecutionPhase::Cancelled,
                    Some(plan),
                    skipped_all(&command.tools, reason),
                    Some(error),
                );
            }
        }

        advance(&mut tracker, ExecutionPhase::Executing, progress);
        let (records, stop) = self.run_tools(command, progress, cancel).await;

        let phase = match &stop {
            None => ExecutionPhase::Succeeded,
            Some(PipelineError::Cancelled { .. }) => ExecutionPhase::Cancelled,
            Some(_) => ExecutionPhase::Failed,
        };
        advance(&mut tracker, phase, progress);
        self.finish(command, phase, Some(plan), records, stop)
    }

    /// Resolve every command tool against the live registry
    fn revalidate(&self, command: &Command) -> Result<Vec<ToolDescriptor>, PipelineError> {
        if command.tools.is_empty() {
            return Err(PipelineError::unresolved("the command has no tools"));
        }
        command
            .tools
            .iter()
            .map(|tool| {
                self.registry
                    .lookup(tool.as_str())
                    .ok_or_else(|| PipelineError::StaleToolReference { tool: tool.clone() })
            })
            .collect()
    }

    async fn dry_run(
        &self,
        command: &Command,
        live: &[ToolDescriptor],
    ) -> Result<ExecutionPlan, PipelineError> {
        let missing: Vec<String> = command
            .tools
            .iter()
            .zip(live)
            .flat_map(|(tool, descriptor)| {
                missing_required(&command.params_for(tool), descriptor)
                    .into_iter()
                    .map(move |param| format!("{}.{}", tool, param))
            })
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::InvalidParameter {
                tool: command.tools.first().cloned(),
                message: format!("missing required parameters: {}", missing.join(", ")),
                missing,
            });
        }

        let mut steps = Vec::with_capacity(live.len());
        for (tool, descriptor) in command.tools.iter().zip(live) {
            let args = command.params_for(tool);

            if !descriptor.dry_run_capable {
                debug!(tool = %tool, "Tool cannot dry-run; rendering step locally");
                steps.push(PlanStep {
                    tool: tool.clone(),
                    rendered_action: render_call(tool, &args),
                    estimated_effect: default_effect(descriptor.risk_hint).to_string(),
                    verification: StepVerification::Unverified,
                });
                continue;
            }

            let started = Instant::now();
            let invoked = timeout(
                self.tool_timeout,
                self.registry.invoke(tool.as_str(), args, ToolMode::DryRun),
            )
            .await;
            let ok = matches!(&invoked, Ok(Ok(r)) if !r.is_error);
            self.telemetry
                .tool_latency(tool.as_str(), true, started.elapsed(), ok);

            let response = match invoked {
                Err(_) => {
                    return Err(PipelineError::ToolTimeout {
                        tool: tool.clone(),
                        after_ms: millis(self.tool_timeout),
                    });
                }
                Ok(Err(e)) => return Err(registry_error(tool, e)),
                Ok(Ok(response)) if response.is_error => {
                    return Err(PipelineError::ToolExecution {
                        tool: tool.clone(),
                        message: response_text(&response),
                    });
                }
                Ok(Ok(response)) => response,
            };

            steps.push(PlanStep {
                tool: tool.clone(),
                rendered_action: response_text(&response),
                estimated_effect: reported_effect(&response)
                    .unwrap_or_else(|| default_effect(descriptor.risk_hint).to_string()),
                verification: StepVerification::Verified,
            });
        }

        Ok(ExecutionPlan::new(steps))
    }

    async fn ask(
        &self,
        command: &Command,
        risk_level: RiskLevel,
        plan: &ExecutionPlan,
        confirm: &dyn ConfirmationPort,
        cancel: &CancellationToken,
    ) -> bool {
        let request = ConfirmationRequest {
            description: &command.description,
            risk_level,
            tools: &command.tools,
            plan,
        };

        let answer = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            answer = confirm.confirm(&request) => Some(answer),
        };

        let accepted = match answer {
            Some(Ok(accepted)) => accepted,
            Some(Err(e)) => {
                warn!(error = %e, "Confirmation failed; treating as declined");
                false
            }
            None => false,
        };
        self.telemetry.confirmation(risk_level, accepted);
        accepted
    }

    /// Invoke tools in order; returns one record per tool and the stop reason
    async fn run_tools(
        &self,
        command: &Command,
        progress: &dyn ExecutionProgress,
        cancel: &CancellationToken,
    ) -> (Vec<ToolRunRecord>, Option<PipelineError>) {
        let total = command.tools.len();
        let mut records = Vec::with_capacity(total);
        let mut stop: Option<(PipelineError, SkipReason)> = None;

        for (index, tool) in command.tools.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(next = %tool, "Cancelled between tools");
                stop = Some((
                    PipelineError::Cancelled {
                        next_tool: tool.clone(),
                    },
                    SkipReason::Cancelled,
                ));
                break;
            }

            progress.on_tool_start(tool, index, total);
            let started = Instant::now();
            let invoked = timeout(
                self.tool_timeout,
                self.registry
                    .invoke(tool.as_str(), command.params_for(tool), ToolMode::Execute),
            )
            .await;
            let elapsed = started.elapsed();

            let (outcome, failure) = match invoked {
                Err(_) => {
                    let after_ms = millis(self.tool_timeout);
                    (
                        ToolRunOutcome::TimedOut { after_ms },
                        Some(PipelineError::ToolTimeout {
                            tool: tool.clone(),
                            after_ms,
                        }),
                    )
                }
                Ok(Ok(response)) if !response.is_error => (
                    ToolRunOutcome::Succeeded {
                        output: response_text(&response),
                    },
                    None,
                ),
                Ok(Ok(response)) => {
                    let message = response_text(&response);
                    (
                        ToolRunOutcome::Failed {
                            message: message.clone(),
                        },
                        Some(PipelineError::ToolExecution {
                            tool: tool.clone(),
                            message,
                        }),
                    )
                }
                Ok(Err(e)) => {
                    let error = registry_error(tool, e);
                    (
                        ToolRunOutcome::Failed {
                            message: error.to_string(),
                        },
                        Some(error),
                    )
                }
            };

            self.telemetry
                .tool_latency(tool.as_str(), false, elapsed, failure.is_none());
            progress.on_tool_complete(tool, &outcome);
            records.push(ToolRunRecord::new(tool.clone(), outcome).with_duration(millis(elapsed)));

            if let Some(error) = failure {
                warn!(tool = %tool, error = %error, "Tool failed; skipping the rest of the command");
                stop = Some((error, SkipReason::PriorFailure));
                break;
            }
        }

        let reason = stop
            .as_ref()
            .map(|(_, reason)| *reason)
            .unwrap_or(SkipReason::PriorFailure);
        for tool in &command.tools[records.len()..] {
            records.push(ToolRunRecord::new(
                tool.clone(),
                ToolRunOutcome::skipped(reason),
            ));
        }

        (records, stop.map(|(error, _)| error))
    }

    /// Fail before execution: nothing ran
    fn abort(
        &self,
        command: &Command,
        tracker: &mut PhaseTracker,
        progress: &dyn ExecutionProgress,
        error: PipelineError,
    ) -> ExecutionResult {
        warn!(intent = %command.intent, error = %error, "Command aborted before execution");
        advance(tracker, ExecutionPhase::Failed, progress);
        self.finish(
            command,
            ExecutionPhase::Failed,
            None,
            skipped_all(&command.tools, SkipReason::Aborted),
            Some(error),
        )
    }

    fn finish(
        &self,
        command: &Command,
        phase: ExecutionPhase,
        plan: Option<ExecutionPlan>,
        records: Vec<ToolRunRecord>,
        error: Option<PipelineError>,
    ) -> ExecutionResult {
        let success = error.is_none();
        let output = match &error {
            None => success_output(&records),
            Some(e) => failure_output(e, &records),
        };
        self.telemetry.command_finished(
            &command.intent,
            success,
            error.as_ref().map(PipelineError::kind),
        );
        info!(intent = %command.intent, phase = %phase, success, "Command finished");

        ExecutionResult {
            success,
            output,
            error: error.as_ref().map(PipelineError::to_info),
            per_tool_results: records,
            plan,
            final_phase: phase,
        }
    }
}

fn advance(tracker: &mut PhaseTracker, next: ExecutionPhase, progress: &dyn ExecutionProgress) {
    match tracker.advance(next) {
        Ok(phase) => {
            debug!(phase = %phase, "Phase transition");
            progress.on_phase(phase);
        }
        Err(e) => warn!(error = %e, "Rejected phase transition"),
    }
}

fn registry_error(tool: &ToolName, error: RegistryError) -> PipelineError {
    match error {
        RegistryError::UnknownTool(_) => PipelineError::StaleToolReference { tool: tool.clone() },
        RegistryError::InvalidParameters { violations, .. } => PipelineError::InvalidParameter {
            tool: Some(tool.clone()),
            message: violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            missing: violations
                .iter()
                .filter(|v| matches!(v, SchemaViolation::Missing { .. }))
                .map(|v| format!("{}.{}", tool, v.param()))
                .collect(),
        },
        RegistryError::Backend { source, .. } => PipelineError::ToolExecution {
            tool: tool.clone(),
            message: source.to_string(),
        },
        RegistryError::DuplicateTool(_) => PipelineError::ToolExecution {
            tool: tool.clone(),
            message: error.to_string(),
        },
    }
}

fn skipped_all(tools: &[ToolName], reason: SkipReason) -> Vec<ToolRunRecord> {
    tools
        .iter()
        .map(|t| ToolRunRecord::new(t.clone(), ToolRunOutcome::skipped(reason)))
        .collect()
}

/// Text content of a response, or the full rendering if it has none
fn response_text(response: &ToolResponse) -> String {
    let texts: Vec<&str> = response
        .content
        .iter()
        .filter_map(|c| match c {
            ContentItem::Text(t) => Some(t.as_str()),
            ContentItem::Structured(_) => None,
        })
        .collect();
    if texts.is_empty() {
        response.render()
    } else {
        texts.join("\n")
    }
}

/// `effect` field of the first structured item, if a backend reported one
fn reported_effect(response: &ToolResponse) -> Option<String> {
    response.content.iter().find_map(|c| match c {
        ContentItem::Structured(value) => value
            .get("effect")
            .and_then(|e| e.as_str())
            .map(str::to_string),
        ContentItem::Text(_) => None,
    })
}

fn default_effect(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Safe => "Read-only; the system is not changed",
        RiskLevel::Moderate => "Changes system state; can be undone",
        RiskLevel::Destructive => "Changes system state in ways that may not be reversible",
    }
}

fn render_call(tool: &ToolName, args: &ToolArguments) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|(k, v)| format!("{}={}", k, render_value(v)))
        .collect();
    format!("{} {}", tool, rendered.join(" ")).trim_end().to_string()
}

fn success_output(records: &[ToolRunRecord]) -> String {
    let outputs: Vec<(&ToolName, &str)> = records
        .iter()
        .filter_map(|r| match &r.outcome {
            ToolRunOutcome::Succeeded { output } => Some((&r.tool, output.as_str())),
            _ => None,
        })
        .collect();
    match outputs.as_slice() {
        [(_, output)] => output.to_string(),
        many => many
            .iter()
            .map(|(tool, output)| format!("[{}]\n{}", tool, output))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn failure_output(error: &PipelineError, records: &[ToolRunRecord]) -> String {
    let completed: Vec<&str> = records
        .iter()
        .filter(|r| r.outcome.is_success())
        .map(|r| r.tool.as_str())
        .collect();
    if completed.is_empty() {
        format!("{}. No tools completed.", error)
    } else {
        format!("{}. Completed before stopping: {}.", error, completed.join(", "))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::confirmation::{AutoApprove, AutoDecline, FnConfirmation};
    use crate::test_support::{ScriptedBackend, descriptor, name};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use steward_domain::{ErrorKind, ToolParameter};

    fn command(tools: &[(&str, serde_json::Value)], risk: RiskLevel) -> Command {
        let mut params = BTreeMap::new();
        for (tool, args) in tools {
            params.insert(
                name(tool),
                args.as_object().cloned().unwrap_or_else(ToolArguments::new),
            );
        }
        Command {
            intent: tools.iter().map(|(t, _)| *t).collect::<Vec<_>>().join("+"),
            tools: tools.iter().map(|(t, _)| name(t)).collect(),
            params,
            confirmation_required: risk.requires_confirmation(),
            description: "test command".into(),
            risk_level: risk,
            missing: Vec::new(),
            confidence: 0.9,
            utterance: "test".into(),
        }
    }

    async fn executor_with(backend: ScriptedBackend) -> (SafetyExecutor, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let registry = Arc::new(ToolRegistry::new());
        registry.register_backend(backend.clone()).await.unwrap();
        let config = PipelineConfig::default().with_tool_timeout(Duration::from_secs(5));
        (SafetyExecutor::new(registry, &config), backend)
    }

    fn counting_confirm(answer: bool) -> (impl ConfirmationPort, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let port = FnConfirmation::new(move |_req: &ConfirmationRequest<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            answer
        });
        (port, calls)
    }

    #[tokio::test]
    async fn test_safe_command_runs_without_confirmation() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b").with_tool(descriptor("check_system_requirements", RiskLevel::Safe)),
        )
        .await;
        let (confirm, calls) = counting_confirm(false);

        let result = executor
            .execute(&command(&[("check_system_requirements", json!({}))], RiskLevel::Safe), &confirm)
            .await;

        assert!(result.success);
        assert_eq!(result.final_phase, ExecutionPhase::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.output, "Ran check_system_requirements");
        assert_eq!(
            backend.calls(),
            vec![
                (name("check_system_requirements"), ToolMode::DryRun),
                (name("check_system_requirements"), ToolMode::Execute),
            ]
        );
    }

    #[tokio::test]
    async fn test_declined_confirmation_executes_nothing() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b").with_tool(descriptor("install_package", RiskLevel::Moderate)),
        )
        .await;

        let result = executor
            .execute(&command(&[("install_package", json!({}))], RiskLevel::Moderate), &AutoDecline)
            .await;

        assert!(!result.success);
        assert_eq!(result.final_phase, ExecutionPhase::Cancelled);
        assert_eq!(result.error_kind(), Some(ErrorKind::ConfirmationDeclined));
        assert!(result.was_cancelled());
        assert!(result.plan.is_some());
        assert!(backend.executed().is_empty());
        assert_eq!(
            result.per_tool_results[0].outcome,
            ToolRunOutcome::skipped(SkipReason::NotConfirmed)
        );
    }

    #[tokio::test]
    async fn test_confirmation_sees_full_plan_before_any_execution() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(descriptor("install_package", RiskLevel::Moderate))
                .with_tool(descriptor("manage_service", RiskLevel::Moderate))
                .with_response(
                    "install_package",
                    ToolMode::DryRun,
                    ToolResponse::text("Would execute: apt-get install -y nginx")
                        .with_structured(json!({"effect": "Installs 1 package"})),
                ),
        )
        .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let confirm = FnConfirmation::new(move |req: &ConfirmationRequest<'_>| {
            sink.lock().unwrap().push(req.plan.clone());
            true
        });

        let result = executor
            .execute(
                &command(
                    &[("install_package", json!({})), ("manage_service", json!({}))],
                    RiskLevel::Moderate,
                ),
                &confirm,
            )
            .await;

        assert!(result.success);
        let plans = seen.lock().unwrap();
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].rendered_action, "Would execute: apt-get install -y nginx");
        assert_eq!(plan.steps[0].estimated_effect, "Installs 1 package");
        assert!(plan.steps.iter().all(PlanStep::is_verified));

        let modes: Vec<ToolMode> = backend.calls().into_iter().map(|(_, m)| m).collect();
        assert_eq!(
            modes,
            vec![ToolMode::DryRun, ToolMode::DryRun, ToolMode::Execute, ToolMode::Execute]
        );
        assert!(result.output.contains("[install_package]"));
    }

    #[tokio::test]
    async fn test_tool_without_dry_run_is_unverified() {
        let no_dry_run = ToolDescriptor::new(name("manage_service"), "Manage", RiskLevel::Moderate)
            .with_parameter(ToolParameter::new("service", "Service", true));
        let (executor, backend) =
            executor_with(ScriptedBackend::new("b").with_tool(no_dry_run)).await;

        let plan = executor
            .plan_dry_run(&command(
                &[("manage_service", json!({"service": "nginx"}))],
                RiskLevel::Moderate,
            ))
            .await
            .unwrap();

        assert_eq!(plan.steps[0].verification, StepVerification::Unverified);
        assert_eq!(plan.steps[0].rendered_action, "manage_service service=nginx");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_tools() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(descriptor("check_system_requirements", RiskLevel::Safe))
                .with_tool(descriptor("install_package", RiskLevel::Moderate))
                .with_tool(descriptor("manage_service", RiskLevel::Moderate))
                .with_response(
                    "install_package",
                    ToolMode::Execute,
                    ToolResponse::error("E: Unable to locate package nginx"),
                ),
        )
        .await;

        let result = executor
            .execute(
                &command(
                    &[
                        ("check_system_requirements", json!({})),
                        ("install_package", json!({})),
                        ("manage_service", json!({})),
                    ],
                    RiskLevel::Moderate,
                ),
                &AutoApprove,
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.final_phase, ExecutionPhase::Failed);
        assert_eq!(result.per_tool_results.len(), 3);
        assert!(result.per_tool_results[0].outcome.is_success());
        assert!(matches!(
            result.per_tool_results[1].outcome,
            ToolRunOutcome::Failed { .. }
        ));
        assert_eq!(
            result.per_tool_results[2].outcome,
            ToolRunOutcome::skipped(SkipReason::PriorFailure)
        );
        let error = result.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::ToolExecution);
        assert_eq!(error.tool_name, Some(name("install_package")));
        assert!(!error.recoverable);
        assert!(result.output.contains("Completed before stopping: check_system_requirements"));
        assert!(!backend.executed().contains(&name("manage_service")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_the_command() {
        let (executor, _backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(
                    ToolDescriptor::new(name("install_package"), "Install", RiskLevel::Moderate),
                )
                .with_tool(descriptor("manage_service", RiskLevel::Moderate))
                .with_tool_delay("install_package", Duration::from_secs(60)),
        )
        .await;

        let result = executor
            .execute(
                &command(
                    &[("install_package", json!({})), ("manage_service", json!({}))],
                    RiskLevel::Moderate,
                ),
                &AutoApprove,
            )
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::ToolTimeout));
        assert_eq!(
            result.per_tool_results[0].outcome,
            ToolRunOutcome::TimedOut { after_ms: 5_000 }
        );
        assert_eq!(
            result.per_tool_results[1].outcome,
            ToolRunOutcome::skipped(SkipReason::PriorFailure)
        );
    }

    #[tokio::test]
    async fn test_stale_reference_fails_before_side_effects() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(descriptor("install_package", RiskLevel::Moderate))
                .with_tool(descriptor("manage_service", RiskLevel::Moderate)),
        )
        .await;
        let cmd = command(
            &[("install_package", json!({})), ("manage_service", json!({}))],
            RiskLevel::Moderate,
        );
        executor.registry().deregister("manage_service").await.unwrap();

        let result = executor.execute(&cmd, &AutoApprove).await;

        assert_eq!(result.error_kind(), Some(ErrorKind::StaleToolReference));
        assert_eq!(result.final_phase, ExecutionPhase::Failed);
        assert!(result.error.as_ref().unwrap().recoverable);
        assert!(backend.calls().is_empty());
        assert!(result.per_tool_results.iter().all(|r| !r.outcome.ran()));
    }

    #[tokio::test]
    async fn test_live_risk_overrides_routed_flag() {
        let (executor, _backend) = executor_with(
            ScriptedBackend::new("b").with_tool(descriptor("remove_package", RiskLevel::Destructive)),
        )
        .await;
        let mut cmd = command(&[("remove_package", json!({}))], RiskLevel::Safe);
        cmd.confirmation_required = false;

        let risks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&risks);
        let confirm = FnConfirmation::new(move |req: &ConfirmationRequest<'_>| {
            sink.lock().unwrap().push(req.risk_level);
            false
        });

        let result = executor.execute(&cmd, &confirm).await;

        assert_eq!(*risks.lock().unwrap(), vec![RiskLevel::Destructive]);
        assert_eq!(result.error_kind(), Some(ErrorKind::ConfirmationDeclined));
    }

    #[tokio::test]
    async fn test_missing_parameters_are_invalid_not_guessed() {
        let tool = descriptor("check_system_requirements", RiskLevel::Safe)
            .with_parameter(ToolParameter::new("software", "Software", true));
        let (executor, backend) = executor_with(ScriptedBackend::new("b").with_tool(tool)).await;

        let result = executor
            .execute(
                &command(&[("check_system_requirements", json!({}))], RiskLevel::Safe),
                &AutoApprove,
            )
            .await;

        let error = result.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::InvalidParameter);
        assert!(error.recoverable);
        assert!(error.message.contains("check_system_requirements.software"));
        assert!(result.plan.is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_rejection_aborts_before_confirmation() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(descriptor("install_oracle_database", RiskLevel::Destructive))
                .with_response(
                    "install_oracle_database",
                    ToolMode::DryRun,
                    ToolResponse::error("Insufficient memory: requested 64 GB, 16 GB installed"),
                ),
        )
        .await;
        let (confirm, calls) = counting_confirm(true);

        let result = executor
            .execute(
                &command(&[("install_oracle_database", json!({}))], RiskLevel::Destructive),
                &confirm,
            )
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::ToolExecution));
        assert!(result.output.contains("Insufficient memory"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(backend.executed().is_empty());
    }

    struct CancelAfterFirst(CancellationToken);

    impl ExecutionProgress for CancelAfterFirst {
        fn on_tool_complete(&self, _tool: &ToolName, _outcome: &ToolRunOutcome) {
            self.0.cancel();
        }
    }

    #[tokio::test]
    async fn test_cancellation_between_tools() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b")
                .with_tool(descriptor("install_package", RiskLevel::Moderate))
                .with_tool(descriptor("manage_service", RiskLevel::Moderate)),
        )
        .await;
        let token = CancellationToken::new();

        let result = executor
            .execute_with(
                &command(
                    &[("install_package", json!({})), ("manage_service", json!({}))],
                    RiskLevel::Moderate,
                ),
                &AutoApprove,
                &CancelAfterFirst(token.clone()),
                &token,
            )
            .await;

        assert_eq!(result.final_phase, ExecutionPhase::Cancelled);
        assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(result.completed_tools(), vec![&name("install_package")]);
        assert_eq!(
            result.per_tool_results[1].outcome,
            ToolRunOutcome::skipped(SkipReason::Cancelled)
        );
        assert_eq!(backend.executed(), vec![name("install_package")]);
    }

    #[tokio::test]
    async fn test_plan_dry_run_is_idempotent() {
        let (executor, backend) = executor_with(
            ScriptedBackend::new("b").with_tool(descriptor("install_package", RiskLevel::Moderate)),
        )
        .await;
        let cmd = command(&[("install_package", json!({}))], RiskLevel::Moderate);

        let first = executor.plan_dry_run(&cmd).await.unwrap();
        let second = executor.plan_dry_run(&cmd).await.unwrap();

        assert_eq!(first, second);
        assert!(backend.executed().is_empty());
    }
}
