//! Tool domain entities

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a tool identifier in bytes
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Error returned when a string is not a valid tool identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid tool name '{name}': {reason}")]
pub struct InvalidToolName {
    pub name: String,
    pub reason: &'static str,
}

/// Validated tool identifier (e.g., "install_package").
///
/// Names start with an ASCII lowercase letter and continue with lowercase
/// letters, digits or underscores. Anything else is rejected at construction,
/// so a `ToolName` in hand is always a well-formed registry key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidToolName> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_TOOL_NAME_LEN {
            Some("longer than 64 bytes")
        } else if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            Some("must start with a lowercase letter")
        } else if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            Some("only lowercase letters, digits and '_' are allowed")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidToolName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = InvalidToolName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ToolName {
    type Error = InvalidToolName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Risk level of a tool operation.
///
/// Ordered from least to most dangerous, so `max()` over a command's tools
/// yields the command's overall risk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Read-only inspection (e.g., check_system_requirements)
    #[default]
    Safe,
    /// Changes system state in a recoverable way (e.g., install_package)
    Moderate,
    /// Hard to reverse or data-destroying (e.g., remove_package)
    Destructive,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Safe, RiskLevel::Moderate, RiskLevel::Destructive];

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Destructive => "destructive",
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, RiskLevel::Safe)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "safe" | "low" => Ok(RiskLevel::Safe),
            "moderate" | "medium" => Ok(RiskLevel::Moderate),
            "destructive" | "high" => Ok(RiskLevel::Destructive),
            other => Err(format!("unknown risk level: {}", other)),
        }
    }
}

/// Value type accepted by a tool parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    StringList,
}

impl ParamKind {
    /// JSON Schema type name
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::StringList => "array",
        }
    }

    pub fn from_json_type(s: &str) -> Self {
        match s {
            "number" => ParamKind::Number,
            "integer" => ParamKind::Integer,
            "boolean" => ParamKind::Boolean,
            "array" => ParamKind::StringList,
            _ => ParamKind::String,
        }
    }
}

/// How a rule-based resolver can pull a parameter value out of an utterance.
///
/// Hints are advisory: model-backed resolvers ignore them and produce the
/// parameters directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionHint {
    /// No extraction; default or explicit value only
    #[default]
    None,
    /// The word following any of these words ("install <nginx>")
    AfterKeyword { words: Vec<String> },
    /// The first utterance word equal to one of the parameter's allowed values
    Choice,
    /// A number with a unit near one of the context words ("8GB memory")
    Quantity { unit: String, context: Vec<String> },
    /// Boolean switched on or off by phrases ("with ssl" / "without ssl")
    Flag { on: Vec<String>, off: Vec<String> },
    /// A word that looks like a DNS domain ("example.com")
    Domain,
    /// A word that looks like an absolute path ("/opt/oracle")
    Path,
    /// A word that looks like a version ("21c", "1.24")
    Version,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Value type
    #[serde(default)]
    pub kind: ParamKind,
    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
    /// Value used when the parameter is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Allowed values (empty = unrestricted)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    /// Extraction hint for rule-based routing
    #[serde(default)]
    pub hint: ExtractionHint,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ParamKind::String,
            required,
            default: None,
            allowed: Vec::new(),
            hint: ExtractionHint::None,
        }
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_allowed<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hint(mut self, hint: ExtractionHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Descriptor of a backend tool: name, schema and risk hints.
///
/// Registered once in the tool registry and immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name of the tool
    pub name: ToolName,
    /// Human-readable description
    pub description: String,
    /// Parameter schema, in declaration order
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Risk of running this tool for real
    pub risk_hint: RiskLevel,
    /// Whether the backend can project the call without side effects
    #[serde(default)]
    pub dry_run_capable: bool,
    /// Intent keyword phrases used by rule-based routing
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ToolDescriptor {
    pub fn new(name: ToolName, description: impl Into<String>, risk_hint: RiskLevel) -> Self {
        Self {
            name,
            description: description.into(),
            parameters: Vec::new(),
            risk_hint,
            dry_run_capable: false,
            keywords: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_dry_run(mut self) -> Self {
        self.dry_run_capable = true;
        self
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords
            .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}
