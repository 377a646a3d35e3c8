//! Tool-invocation protocol value objects
//!
//! These types form the message boundary between the safety executor and
//! backend tool servers. A request names the tool, carries schema-validated
//! arguments and says whether the call is a dry run; a response is an
//! ordered list of content items plus an `is_error` flag.
//!
//! ```text
//! ToolRequest { tool_name, arguments, mode }
//!        │
//!        ▼  (in-process call or JSON line to a subprocess)
//! ToolResponse { content: [text | structured], is_error }
//! ```

use serde::{Deserialize, Serialize};

use super::entities::ToolName;
use super::traits::ToolArguments;

/// Invocation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Project what would happen; must never mutate system state
    DryRun,
    /// Perform the operation
    Execute,
}

impl ToolMode {
    pub fn as_str(&self) -> &str {
        match self {
            ToolMode::DryRun => "dry_run",
            ToolMode::Execute => "execute",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, ToolMode::DryRun)
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to a backend tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub tool_name: ToolName,
    #[serde(default)]
    pub arguments: ToolArguments,
    pub mode: ToolMode,
}

impl ToolRequest {
    pub fn new(tool_name: ToolName, arguments: ToolArguments, mode: ToolMode) -> Self {
        Self {
            tool_name,
            arguments,
            mode,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One item of a tool response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContentItem {
    Text(String),
    Structured(serde_json::Value),
}

impl ContentItem {
    /// Render the item as display text
    pub fn render(&self) -> String {
        match self {
            ContentItem::Text(text) => text.clone(),
            ContentItem::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// A response from a backend tool server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text(text.into())],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text(text.into())],
            is_error: true,
        }
    }

    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.content.push(ContentItem::Structured(value));
        self
    }

    /// All content items rendered and joined by blank lines
    pub fn render(&self) -> String {
        self.content
            .iter()
            .map(ContentItem::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The first text item, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ContentItem::Text(t) => Some(t.as_str()),
            ContentItem::Structured(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let mut args = ToolArguments::new();
        args.insert("package".into(), json!("nginx"));
        let request = ToolRequest::new(
            ToolName::new("install_package").unwrap(),
            args,
            ToolMode::DryRun,
        );

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["toolName"], "install_package");
        assert_eq!(wire["mode"], "dry_run");
        assert_eq!(wire["arguments"]["package"], "nginx");
        assert_eq!(request.get_string("package"), Some("nginx"));
    }

    #[test]
    fn test_response_wire_shape() {
        let response = ToolResponse::text("done").with_structured(json!({"exit_code": 0}));
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["isError"], false);
        assert_eq!(wire["content"][0], json!({"type": "text", "value": "done"}));
        assert_eq!(wire["content"][1]["type"], "structured");

        let parsed: ToolResponse =
            serde_json::from_value(json!({"content": [{"type": "text", "value": "boom"}], "isError": true}))
                .unwrap();
        assert!(parsed.is_error);
        assert_eq!(parsed.first_text(), Some("boom"));
    }

    #[test]
    fn test_render_joins_items() {
        let response = ToolResponse::text("line one").with_structured(json!({"a": 1}));
        let rendered = response.render();
        assert!(rendered.starts_with("line one\n\n"));
        assert!(rendered.contains("\"a\": 1"));
    }
}
