//! JSON output, one document per command

use serde_json::{Value, json};
use steward_application::PipelineError;
use steward_domain::{Command, ExecutionPlan, ExecutionResult, ToolCatalog};

use super::formatter::OutputFormatter;

pub struct JsonFormatter;

fn render(value: Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

impl OutputFormatter for JsonFormatter {
    fn format_plan(&self, command: &Command, plan: &ExecutionPlan) -> String {
        render(json!({ "command": command, "plan": plan }))
    }

    fn format_result(&self, command: &Command, result: &ExecutionResult) -> String {
        render(json!({ "command": command, "result": result }))
    }

    fn format_error(&self, utterance: &str, error: &PipelineError) -> String {
        render(json!({
            "utterance": utterance,
            "error": error.to_info(),
            "suggestions": error.suggestions(),
        }))
    }

    fn format_tools(&self, catalog: &ToolCatalog) -> String {
        let tools: Vec<_> = catalog.iter().map(|(_, d)| d).collect();
        render(json!({ "tools": tools }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_domain::{ErrorKind, ToolName};

    #[test]
    fn test_error_document() {
        let error = PipelineError::UnresolvedIntent {
            message: "no tool matches 'make coffee'".into(),
            suggestions: vec!["install_package".into()],
        };
        let doc: Value = serde_json::from_str(&JsonFormatter.format_error("make coffee", &error))
            .unwrap();
        assert_eq!(doc["error"]["kind"], serde_json::to_value(ErrorKind::UnresolvedIntent).unwrap());
        assert_eq!(doc["suggestions"][0], "install_package");
    }

    #[test]
    fn test_timeout_error_is_not_recoverable() {
        let error = PipelineError::ToolTimeout {
            tool: ToolName::new("install_package").unwrap(),
            after_ms: 300_000,
        };
        let doc: Value =
            serde_json::from_str(&JsonFormatter.format_error("install nginx", &error)).unwrap();
        assert_eq!(doc["error"]["recoverable"], false);
        assert_eq!(doc["error"]["tool_name"], "install_package");
    }
}
