//! Hybrid resolver: keyword rules first, classifier as fallback.
//!
//! The classifier is only consulted when the rules are unsure (below the
//! threshold) or found nothing. Its answer replaces the rule answer only
//! when it is more confident.

use async_trait::async_trait;
use steward_domain::ToolCatalog;

use super::model::ModelResolver;
use super::rule_based::RuleBasedResolver;
use crate::ports::intent::{IntentResolver, Resolution, ResolveError};

pub struct HybridResolver {
    rules: RuleBasedResolver,
    model: ModelResolver,
    threshold: f32,
}

impl HybridResolver {
    pub fn new(model: ModelResolver, threshold: f32) -> Self {
        Self {
            rules: RuleBasedResolver::new(),
            model,
            threshold,
        }
    }
}

#[async_trait]
impl IntentResolver for HybridResolver {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn resolve(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<Resolution, ResolveError> {
        let rules = self.rules.resolve_now(utterance, catalog);
        if let Ok(resolution) = &rules
            && resolution.confidence >= self.threshold
        {
            return rules;
        }

        match self.model.resolve(utterance, catalog).await {
            Ok(model) => match rules {
                Ok(rule) if rule.confidence >= model.confidence => Ok(rule),
                _ => Ok(model),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Intent classifier unavailable, using keyword rules");
                rules
            }
        }
    }
}
