//! Pipeline parameters: routing thresholds and execution limits.
//!
//! [`PipelineConfig`] groups the static parameters consumed by the
//! [`Router`](crate::use_cases::route_command::Router) and the
//! [`SafetyExecutor`](crate::use_cases::execute_command::SafetyExecutor).
//! The infrastructure config loader maps the `[router]` and `[executor]`
//! file sections onto it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which intent resolver the router uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Keyword rules only; deterministic and offline
    #[default]
    Rules,
    /// The intent classifier only
    Model,
    /// Rules first, classifier when rules are unsure
    Hybrid,
}

impl ResolverStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            ResolverStrategy::Rules => "rules",
            ResolverStrategy::Model => "model",
            ResolverStrategy::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rules" | "rule" => Ok(ResolverStrategy::Rules),
            "model" | "llm" => Ok(ResolverStrategy::Model),
            "hybrid" => Ok(ResolverStrategy::Hybrid),
            other => Err(format!(
                "unknown resolver '{}' (expected rules, model or hybrid)",
                other
            )),
        }
    }
}

/// Routing and execution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Resolver strategy.
    pub resolver: ResolverStrategy,
    /// Commands below this confidence are rejected as unresolved.
    pub min_confidence: f32,
    /// Commands containing a destructive tool need at least this confidence.
    pub destructive_min_confidence: f32,
    /// Hybrid only: rule results at or above this skip the classifier.
    pub hybrid_rule_threshold: f32,
    /// Per-invocation budget for backend tools (dry run and execute).
    pub tool_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverStrategy::Rules,
            min_confidence: 0.5,
            destructive_min_confidence: 0.75,
            hybrid_rule_threshold: 0.8,
            tool_timeout: Duration::from_secs(300),
        }
    }
}

impl PipelineConfig {
    // ==================== Builder Methods ====================

    pub fn with_resolver(mut self, resolver: ResolverStrategy) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_min_confidence(mut self, min: f32) -> Self {
        self.min_confidence = min;
        self
    }

    pub fn with_destructive_min_confidence(mut self, min: f32) -> Self {
        self.destructive_min_confidence = min;
        self
    }

    pub fn with_hybrid_rule_threshold(mut self, threshold: f32) -> Self {
        self.hybrid_rule_threshold = threshold;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }
}
