//! Risk classification - the single source of truth for confirmation.
//!
//! Policy: a command's risk is the maximum `risk_hint` over the descriptors
//! of the tools it references (destructive > moderate > safe), and
//! confirmation is required for anything that is not safe.
//!
//! The classifier is pure. Callers that execute a command re-run it against
//! the live catalog instead of trusting a flag computed at routing time.

use crate::tool::{RiskLevel, ToolCatalog, ToolDescriptor, ToolName};

use super::entities::Command;

/// Outcome of classifying a set of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub confirmation_required: bool,
}

impl From<RiskLevel> for RiskAssessment {
    fn from(risk_level: RiskLevel) -> Self {
        Self {
            risk_level,
            confirmation_required: risk_level.requires_confirmation(),
        }
    }
}

/// Pure risk classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify descriptors directly. An empty set is safe.
    pub fn classify_descriptors<'a>(
        &self,
        descriptors: impl IntoIterator<Item = &'a ToolDescriptor>,
    ) -> RiskAssessment {
        descriptors
            .into_iter()
            .map(|d| d.risk_hint)
            .max()
            .unwrap_or_default()
            .into()
    }

    /// Classify tool names against a catalog.
    ///
    /// Returns the first name that does not resolve, so a stale reference can
    /// never be silently classified as safe.
    pub fn classify_tools<'a>(
        &self,
        tools: impl IntoIterator<Item = &'a ToolName>,
        catalog: &ToolCatalog,
    ) -> Result<RiskAssessment, ToolName> {
        let mut descriptors = Vec::new();
        for name in tools {
            match catalog.get(name.as_str()) {
                Some(d) => descriptors.push(d),
                None => return Err(name.clone()),
            }
        }
        Ok(self.classify_descriptors(descriptors))
    }

    /// Classify a routed command against a catalog
    pub fn classify(
        &self,
        command: &Command,
        catalog: &ToolCatalog,
    ) -> Result<RiskAssessment, ToolName> {
        self.classify_tools(&command.tools, catalog)
    }
}
