//! Model-backed intent resolver
//!
//! Wraps an [`IntentClassifier`] and holds its answer to the catalog: a
//! tool name the catalog does not know is rejected, never mapped onto the
//! closest match, and an argument the schema does not declare rejects the
//! whole answer.

use std::sync::Arc;

use async_trait::async_trait;
use steward_domain::{ToolCatalog, ToolName};

use super::rule_based::suggestions;
use crate::ports::intent::{
    IntentClassifier, IntentResolver, Resolution, ResolveError, ToolSelection,
};

pub struct ModelResolver {
    classifier: Arc<dyn IntentClassifier>,
}

impl ModelResolver {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl IntentResolver for ModelResolver {
    fn name(&self) -> &str {
        "model"
    }

    async fn resolve(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Resolution, ResolveError> {
        let intent = self
            .classifier
            .classify(utterance, catalog)
            .await
            .map_err(|e| ResolveError::Classifier(e.to_string()))?;

        if intent.steps.is_empty() {
            return Err(ResolveError::NoMatch {
                suggestions: suggestions(catalog),
            });
        }

        let mut selections = Vec::with_capacity(intent.steps.len());
        for step in intent.steps {
            let descriptor = ToolName::new(step.tool.as_str())
                .ok()
                .and_then(|name| catalog.get(name.as_str()))
                .ok_or_else(|| ResolveError::UnknownTool(step.tool.clone()))?;

            if let Some(param) = step
                .params
                .keys()
                .find(|key| descriptor.parameter(key).is_none())
            {
                tracing::warn!(tool = %descriptor.name, param = %param, "Classifier passed an undeclared argument");
                return Err(ResolveError::UndeclaredArgument {
                    tool: descriptor.name.clone(),
                    param: param.clone(),
                });
            }
            selections.push(ToolSelection::new(descriptor.name.clone(), step.params));
        }

        Ok(Resolution {
            selections,
            confidence: intent.confidence.clamp(0.0, 1.0),
            strategy: "model",
        })
    }
}
