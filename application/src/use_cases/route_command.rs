//! Route Command use case
//!
//! Turns one utterance into a typed [`Command`]:
//!
//! 1. normalize the utterance
//! 2. ask the [`IntentResolver`] for tool selections
//! 3. check every selection against the catalog snapshot
//! 4. fill declared defaults and mark unfilled required parameters
//! 5. derive risk and the confirmation gate from the descriptors
//! 6. refuse low-confidence results, with a stricter bar for destructive tools
//!
//! Routing has no side effects: no backend is contacted.

use std::collections::BTreeMap;
use std::sync::Arc;

use steward_domain::{
    Command, DefaultToolValidator, MissingParameter, RiskClassifier, RiskLevel, SchemaViolation,
    ToolCatalog, ToolDescriptor, ToolValidator, tool::apply_defaults, tool::missing_required,
};
use tracing::{debug, info};

use super::error::PipelineError;
use crate::config::PipelineConfig;
use crate::ports::intent::{IntentResolver, ResolveError};
use crate::ports::telemetry::{NoTelemetry, TelemetrySink};
use crate::routing::{describe_command, normalize};

/// Use case for routing utterances to commands
pub struct Router {
    resolver: Arc<dyn IntentResolver>,
    classifier: RiskClassifier,
    validator: DefaultToolValidator,
    min_confidence: f32,
    destructive_min_confidence: f32,
    telemetry: Arc<dyn TelemetrySink>,
}

impl Router {
    pub fn new(resolver: Arc<dyn IntentResolver>, config: &PipelineConfig) -> Self {
        Self {
            resolver,
            classifier: RiskClassifier,
            validator: DefaultToolValidator,
            min_confidence: config.min_confidence,
            destructive_min_confidence: config.destructive_min_confidence,
            telemetry: Arc::new(NoTelemetry),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn resolver_name(&self) -> &str {
        self.resolver.name()
    }

    /// Route an utterance against a catalog snapshot
    pub async fn route(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Command, PipelineError> {
        let result = self.route_inner(utterance, catalog).await;
        match &result {
            Ok(command) => self
                .telemetry
                .command_routed(Some(command.intent.as_str()), command.confidence),
            Err(_) => self.telemetry.command_routed(None, 0.0),
        }
        result
    }

    async fn route_inner(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Command, PipelineError> {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return Err(PipelineError::unresolved("the request is empty"));
        }

        let resolution = self
            .resolver
            .resolve(&normalized, catalog)
            .await
            .map_err(|e| resolve_error(e, &normalized))?;
        if resolution.selections.is_empty() {
            return Err(PipelineError::unresolved(format!(
                "no tool matches '{}'",
                normalized
            )));
        }

        let mut tools = Vec::with_capacity(resolution.selections.len());
        let mut params = BTreeMap::new();
        let mut descriptors: Vec<&ToolDescriptor> = Vec::new();
        let mut missing = Vec::new();

        for selection in resolution.selections {
            let descriptor = catalog.get(selection.tool.as_str()).ok_or_else(|| {
                PipelineError::unresolved(format!(
                    "'{}' is not a registered tool",
                    selection.tool
                ))
            })?;

            if params.contains_key(&selection.tool) {
                return Err(PipelineError::UnresolvedIntent {
                    message: format!(
                        "'{}' appears more than once in one request",
                        selection.tool
                    ),
                    suggestions: vec!["send each repeated operation as its own request".into()],
                });
            }

            let mut args = selection.params;
            apply_defaults(&mut args, descriptor);
            check_schema(&self.validator, &args, descriptor)?;

            missing.extend(
                missing_required(&args, descriptor)
                    .into_iter()
                    .map(|param| MissingParameter {
                        tool: selection.tool.clone(),
                        param,
                    }),
            );

            tools.push(selection.tool.clone());
            params.insert(selection.tool, args);
            descriptors.push(descriptor);
        }

        let assessment = self.classifier.classify_descriptors(descriptors.iter().copied());
        let confidence = resolution.confidence.clamp(0.0, 1.0);
        let candidates: Vec<String> = tools.iter().map(|t| t.to_string()).collect();

        if confidence < self.min_confidence {
            return Err(PipelineError::UnresolvedIntent {
                message: format!(
                    "not confident enough ({:.2}) to act on '{}'",
                    confidence, normalized
                ),
                suggestions: candidates,
            });
        }
        if assessment.risk_level == RiskLevel::Destructive
            && confidence < self.destructive_min_confidence
        {
            return Err(PipelineError::UnresolvedIntent {
                message: format!(
                    "refusing to guess a destructive operation at confidence {:.2}; name the operation explicitly",
                    confidence
                ),
                suggestions: candidates,
            });
        }

        let description = describe_command(
            descriptors
                .iter()
                .copied()
                .zip(tools.iter().map(|t| &params[t])),
        );
        let intent = candidates.join("+");

        info!(
            intent = %intent,
            risk = assessment.risk_level.as_str(),
            confidence,
            strategy = resolution.strategy,
            "Routed command"
        );
        if !missing.is_empty() {
            debug!(missing = ?missing, "Command has unfilled required parameters");
        }

        Ok(Command {
            intent,
            tools,
            params,
            confirmation_required: assessment.confirmation_required,
            description,
            risk_level: assessment.risk_level,
            missing,
            confidence,
            utterance: normalized,
        })
    }
}

fn resolve_error(error: ResolveError, normalized: &str) -> PipelineError {
    match error {
        ResolveError::NoMatch { suggestions } => PipelineError::UnresolvedIntent {
            message: format!("no tool matches '{}'", normalized),
            suggestions,
        },
        ResolveError::UnknownTool(tool) => PipelineError::unresolved(format!(
            "the classifier proposed '{}', which is not a registered tool",
            tool
        )),
        ResolveError::UndeclaredArgument { tool, param } => PipelineError::InvalidParameter {
            message: format!("{} has no parameter '{}'", tool, param),
            tool: Some(tool),
            missing: Vec::new(),
        },
        ResolveError::Classifier(message) => {
            PipelineError::unresolved(format!("intent classifier failed: {}", message))
        }
    }
}

/// Reject type and value violations; missing values are reported separately
fn check_schema(
    validator: &DefaultToolValidator,
    args: &steward_domain::ToolArguments,
    descriptor: &ToolDescriptor,
) -> Result<(), PipelineError> {
    let violations: Vec<SchemaViolation> = validator
        .violations(args, descriptor)
        .into_iter()
        .filter(|v| !matches!(v, SchemaViolation::Missing { .. }))
        .collect();
    if violations.is_empty() {
        return Ok(());
    }
    Err(PipelineError::InvalidParameter {
        tool: Some(descriptor.name.clone()),
        message: violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        missing: Vec::new(),
    })
}
