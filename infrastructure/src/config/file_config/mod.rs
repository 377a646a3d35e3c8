//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is `#[serde(default)]`, so a partial file is always valid;
//! semantic problems are reported by [`FileConfig::validate`] instead of
//! failing the load.

mod audit;
mod backends;
mod executor;
mod output;
mod repl;
mod router;

pub use audit::{FileAuditConfig, FileLoggingConfig, expand_home};
pub use backends::{FileBackendConfig, FileInstallationConfig};
pub use executor::FileExecutorConfig;
pub use output::{FileOutputConfig, OUTPUT_FORMATS};
pub use repl::FileReplConfig;
pub use router::{FileModelConfig, FileRouterConfig};

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use steward_application::{PipelineConfig, ResolverStrategy};

/// How serious a configuration issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value is ignored and a default is used instead
    Warning,
    /// The setting cannot work as written (e.g. a model resolver with no endpoint)
    Error,
}

/// A problem found by [`FileConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key (`router.min_confidence`)
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }

    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub router: FileRouterConfig,
    pub executor: FileExecutorConfig,
    pub audit: FileAuditConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
    pub installation: FileInstallationConfig,
    /// Out-of-process tool servers
    pub backends: Vec<FileBackendConfig>,
}

fn unit_interval(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let router = &self.router;

        match router.resolver.parse::<ResolverStrategy>() {
            Ok(ResolverStrategy::Rules) => {}
            Ok(strategy) => {
                if router.model.endpoint.as_deref().is_none_or(str::is_empty) {
                    issues.push(ConfigIssue::error(
                        "router.model.endpoint",
                        format!(
                            "the '{}' resolver needs an endpoint; falling back to rules",
                            strategy.as_str()
                        ),
                    ));
                }
            }
            Err(e) => {
                issues.push(ConfigIssue::warning(
                    "router.resolver",
                    format!("{}; using rules", e),
                ));
            }
        }

        for (field, value) in [
            ("router.min_confidence", router.min_confidence),
            (
                "router.destructive_min_confidence",
                router.destructive_min_confidence,
            ),
            ("router.hybrid_rule_threshold", router.hybrid_rule_threshold),
        ] {
            if !unit_interval(value) {
                issues.push(ConfigIssue::warning(
                    field,
                    format!("{} is outside [0, 1]; using the default", value),
                ));
            }
        }

        if unit_interval(router.min_confidence)
            && unit_interval(router.destructive_min_confidence)
            && router.destructive_min_confidence < router.min_confidence
        {
            issues.push(ConfigIssue::warning(
                "router.destructive_min_confidence",
                "lower than router.min_confidence, so it has no effect",
            ));
        }

        if router.model.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "router.model.timeout_secs",
                "0 is not a valid timeout; using 20",
            ));
        }

        if self.executor.tool_timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "executor.tool_timeout_secs",
                "0 is not a valid timeout; using 300",
            ));
        }

        if let Some(format) = &self.output.format
            && !OUTPUT_FORMATS.contains(&format.as_str())
        {
            issues.push(ConfigIssue::warning(
                "output.format",
                format!("unknown format '{}'; using text", format),
            ));
        }

        let mut seen = HashSet::new();
        for (i, backend) in self.backends.iter().enumerate() {
            let field = format!("backends[{}]", i);
            if backend.name.trim().is_empty() {
                issues.push(ConfigIssue::error(format!("{}.name", field), "must not be empty"));
            } else if !seen.insert(backend.name.as_str()) {
                issues.push(ConfigIssue::error(
                    format!("{}.name", field),
                    format!("duplicate backend name '{}'", backend.name),
                ));
            }
            if backend.command.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    format!("{}.command", field),
                    "must not be empty",
                ));
            }
        }

        issues
    }

    /// Resolver strategy actually used, after fallbacks
    pub fn resolver_strategy(&self) -> ResolverStrategy {
        let strategy = self.router.resolver.parse().unwrap_or_default();
        let has_endpoint = self
            .router
            .model
            .endpoint
            .as_deref()
            .is_some_and(|e| !e.is_empty());
        if strategy != ResolverStrategy::Rules && !has_endpoint {
            ResolverStrategy::Rules
        } else {
            strategy
        }
    }

    /// Classifier request timeout
    pub fn model_timeout(&self) -> Duration {
        match self.router.model.timeout_secs {
            0 => Duration::from_secs(FileModelConfig::default().timeout_secs),
            secs => Duration::from_secs(secs),
        }
    }

    /// Map the `[router]` and `[executor]` sections onto the pipeline
    /// parameters, replacing invalid values with defaults.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        let pick = |value: f32, default: f32| {
            if unit_interval(value) { value } else { default }
        };
        let timeout = match self.executor.tool_timeout_secs {
            0 => defaults.tool_timeout,
            secs => Duration::from_secs(secs),
        };

        PipelineConfig::default()
            .with_resolver(self.resolver_strategy())
            .with_min_confidence(pick(self.router.min_confidence, defaults.min_confidence))
            .with_destructive_min_confidence(pick(
                self.router.destructive_min_confidence,
                defaults.destructive_min_confidence,
            ))
            .with_hybrid_rule_threshold(pick(
                self.router.hybrid_rule_threshold,
                defaults.hybrid_rule_threshold,
            ))
            .with_tool_timeout(timeout)
    }
}
