//! Tool domain traits
//!
//! Contains pure parameter-schema validation. Registry-level enforcement
//! (rejecting calls before dispatch) lives in the application layer.

use serde_json::Value;
use thiserror::Error;

use super::entities::{ParamKind, ToolDescriptor, ToolParameter};

/// Arguments passed to a tool, keyed by parameter name
pub type ToolArguments = serde_json::Map<String, Value>;

/// A single way in which arguments violate a tool's parameter schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("Missing required parameter '{param}' for tool '{tool}'")]
    Missing { tool: String, param: String },

    #[error("Unknown parameter '{param}' for tool '{tool}'")]
    Unknown { tool: String, param: String },

    #[error("Parameter '{param}' for tool '{tool}' must be of type {expected}")]
    WrongType {
        tool: String,
        param: String,
        expected: &'static str,
    },

    #[error("Parameter '{param}' for tool '{tool}' must be one of: {allowed}")]
    NotAllowed {
        tool: String,
        param: String,
        allowed: String,
    },
}

impl SchemaViolation {
    pub fn param(&self) -> &str {
        match self {
            SchemaViolation::Missing { param, .. }
            | SchemaViolation::Unknown { param, .. }
            | SchemaViolation::WrongType { param, .. }
            | SchemaViolation::NotAllowed { param, .. } => param,
        }
    }
}

/// Validator for tool arguments
///
/// This is a pure domain trait that validates arguments against a tool's
/// declared schema without any I/O operations.
pub trait ToolValidator {
    /// Return every schema violation; an empty vector means the call is valid
    fn violations(&self, args: &ToolArguments, descriptor: &ToolDescriptor)
    -> Vec<SchemaViolation>;

    fn validate(
        &self,
        args: &ToolArguments,
        descriptor: &ToolDescriptor,
    ) -> Result<(), Vec<SchemaViolation>> {
        let violations = self.violations(args, descriptor);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Default implementation of ToolValidator
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn violations(
        &self,
        args: &ToolArguments,
        descriptor: &ToolDescriptor,
    ) -> Vec<SchemaViolation> {
        let tool = descriptor.name.as_str();
        let mut violations = Vec::new();

        for param in &descriptor.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    violations.push(SchemaViolation::Missing {
                        tool: tool.to_string(),
                        param: param.name.clone(),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    if let Some(v) = check_value(tool, param, value) {
                        violations.push(v);
                    }
                }
            }
        }

        for arg_name in args.keys() {
            if descriptor.parameter(arg_name).is_none() {
                violations.push(SchemaViolation::Unknown {
                    tool: tool.to_string(),
                    param: arg_name.clone(),
                });
            }
        }

        violations
    }
}

fn check_value(tool: &str, param: &ToolParameter, value: &Value) -> Option<SchemaViolation> {
    let type_ok = match param.kind {
        ParamKind::String => value.is_string(),
        ParamKind::Number => value.is_number(),
        ParamKind::Integer => value.is_i64() || value.is_u64(),
        ParamKind::Boolean => value.is_boolean(),
        ParamKind::StringList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
    };
    if !type_ok {
        return Some(SchemaViolation::WrongType {
            tool: tool.to_string(),
            param: param.name.clone(),
            expected: param.kind.json_type(),
        });
    }

    if !param.allowed.is_empty()
        && let Some(s) = value.as_str()
        && !param.allowed.iter().any(|a| a == s)
    {
        return Some(SchemaViolation::NotAllowed {
            tool: tool.to_string(),
            param: param.name.clone(),
            allowed: param.allowed.join(", "),
        });
    }

    None
}

/// Fill omitted optional parameters with their declared defaults
pub fn apply_defaults(args: &mut ToolArguments, descriptor: &ToolDescriptor) {
    for param in &descriptor.parameters {
        if let Some(default) = &param.default
            && !args.contains_key(&param.name)
        {
            args.insert(param.name.clone(), default.clone());
        }
    }
}

/// Names of required parameters that are absent (or null) in `args`
pub fn missing_required(args: &ToolArguments, descriptor: &ToolDescriptor) -> Vec<String> {
    descriptor
        .required_parameters()
        .filter(|p| args.get(&p.name).is_none_or(Value::is_null))
        .map(|p| p.name.clone())
        .collect()
}
