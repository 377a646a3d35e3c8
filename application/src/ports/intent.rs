//! Intent resolution ports
//!
//! Two seams sit between an utterance and a [`Command`](steward_domain::Command):
//!
//! - [`IntentResolver`] - turns a normalized utterance into an ordered list
//!   of tool selections with a confidence score. The router owns validation,
//!   defaults and risk; resolvers only propose.
//! - [`IntentClassifier`] - a black-box model (usually an LLM behind HTTP)
//!   used by the model-backed resolver. Implementations live in the
//!   infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steward_domain::{ToolArguments, ToolCatalog, ToolName};
use thiserror::Error;

/// One tool chosen by a resolver, with the arguments it extracted
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSelection {
    pub tool: ToolName,
    pub params: ToolArguments,
}

impl ToolSelection {
    pub fn new(tool: ToolName, params: ToolArguments) -> Self {
        Self { tool, params }
    }
}

/// A resolver's proposal for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Tools in execution order
    pub selections: Vec<ToolSelection>,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Which strategy produced it ("rules", "model")
    pub strategy: &'static str,
}

/// Errors that can occur while resolving intent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("No tool matches the request")]
    NoMatch { suggestions: Vec<String> },

    #[error("Resolver proposed a tool that is not registered: {0}")]
    UnknownTool(String),

    #[error("Resolver passed '{param}' to {tool}, which does not declare it")]
    UndeclaredArgument { tool: ToolName, param: String },

    #[error("Intent classifier failed: {0}")]
    Classifier(String),
}

/// Strategy that maps an utterance onto catalog tools
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &str;

    /// Propose tools for an already-normalized utterance.
    ///
    /// Must never propose a tool that is absent from `catalog`.
    async fn resolve(&self, utterance: &str, catalog: &ToolCatalog)
    -> Result<Resolution, ResolveError>;
}

/// One step proposed by an intent classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStep {
    /// Tool name as returned by the model (unvalidated)
    pub tool: String,
    #[serde(default)]
    pub params: ToolArguments,
}

/// Raw answer of an intent classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelIntent {
    #[serde(default)]
    pub steps: Vec<ModelStep>,
    pub confidence: f32,
}

/// Errors that can occur when calling an intent classifier
#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed classifier response: {0}")]
    Malformed(String),

    #[error("Timeout")]
    Timeout,
}

/// Black-box utterance classifier
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<ModelIntent, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_intent_wire_format() {
        let intent: ModelIntent = serde_json::from_value(json!({
            "steps": [{"tool": "install_package", "params": {"package": "nginx"}}],
            "confidence": 0.9
        }))
        .unwrap();
        assert_eq!(intent.steps.len(), 1);
        assert_eq!(intent.steps[0].params["package"], "nginx");

        let bare: ModelIntent = serde_json::from_value(json!({"confidence": 0.1})).unwrap();
        assert!(bare.steps.is_empty());
    }
}
