//! Command entity - the typed result of routing one utterance

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tool::{RiskLevel, ToolArguments, ToolName};

/// A required parameter the router could not extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingParameter {
    pub tool: ToolName,
    pub param: String,
}

impl std::fmt::Display for MissingParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.tool, self.param)
    }
}

/// Structured command produced by the router.
///
/// Created once per utterance and consumed once by the safety executor.
/// `risk_level` and `confirmation_required` are always policy-derived (see
/// [`RiskClassifier`](super::risk::RiskClassifier)); nothing downstream may
/// lower them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Resolved intent (the tool name, or tool names joined by `+`)
    pub intent: String,
    /// Tools to run, in order (never empty)
    pub tools: Vec<ToolName>,
    /// Arguments per tool
    pub params: BTreeMap<ToolName, ToolArguments>,
    /// Whether a human must confirm before execution
    pub confirmation_required: bool,
    /// One-sentence summary shown before confirmation
    pub description: String,
    /// Overall risk of the command
    pub risk_level: RiskLevel,
    /// Required parameters the router could not fill
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingParameter>,
    /// Resolver confidence in `[0, 1]`
    pub confidence: f32,
    /// Normalized utterance the command was routed from
    pub utterance: String,
}

impl Command {
    /// Whether routing left required parameters unfilled
    pub fn is_incomplete(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Arguments for a tool (empty if none were extracted)
    pub fn params_for(&self, tool: &ToolName) -> ToolArguments {
        self.params.get(tool).cloned().unwrap_or_default()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolName::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command() -> Command {
        let tool = ToolName::new("install_package").unwrap();
        let mut args = ToolArguments::new();
        args.insert("package".into(), json!("nginx"));
        Command {
            intent: "install_package".into(),
            tools: vec![tool.clone()],
            params: BTreeMap::from([(tool, args)]),
            confirmation_required: true,
            description: "Install package nginx".into(),
            risk_level: RiskLevel::Moderate,
            missing: Vec::new(),
            confidence: 0.8,
            utterance: "install nginx".into(),
        }
    }

    #[test]
    fn test_params_for() {
        let cmd = command();
        let tool = ToolName::new("install_package").unwrap();
        assert_eq!(cmd.params_for(&tool)["package"], json!("nginx"));
        assert!(cmd.params_for(&ToolName::new("other").unwrap()).is_empty());
        assert_eq!(cmd.tool_names(), vec!["install_package"]);
    }

    #[test]
    fn test_incomplete_flag() {
        let mut cmd = command();
        assert!(!cmd.is_incomplete());
        cmd.missing.push(MissingParameter {
            tool: ToolName::new("install_package").unwrap(),
            param: "package".into(),
        });
        assert!(cmd.is_incomplete());
        assert_eq!(cmd.missing[0].to_string(), "install_package.package");
    }

    #[test]
    fn test_serde_omits_empty_missing() {
        let wire = serde_json::to_value(command()).unwrap();
        assert!(wire.get("missing").is_none());
        assert_eq!(wire["params"]["install_package"]["package"], "nginx");
        assert_eq!(wire["risk_level"], "moderate");
    }
}
