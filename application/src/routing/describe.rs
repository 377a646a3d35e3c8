//! One-sentence command descriptions shown before confirmation

use serde_json::Value;
use steward_domain::{ToolArguments, ToolDescriptor};

/// Describe a sequence of tool calls as a single sentence.
///
/// Every declared parameter that has a value is listed, defaults included,
/// and required parameters without a value show as `<missing>`.
pub fn describe_command<'a>(
    steps: impl IntoIterator<Item = (&'a ToolDescriptor, &'a ToolArguments)>,
) -> String {
    let parts: Vec<String> = steps
        .into_iter()
        .map(|(descriptor, args)| describe_step(descriptor, args))
        .collect();
    format!("{}.", parts.join(", then "))
}

fn describe_step(descriptor: &ToolDescriptor, args: &ToolArguments) -> String {
    let action = descriptor.description.trim_end_matches('.');
    let rendered: Vec<String> = descriptor
        .parameters
        .iter()
        .filter_map(|p| match args.get(&p.name) {
            Some(Value::Null) | None if p.required => Some(format!("{}=<missing>", p.name)),
            Some(Value::Null) | None => None,
            Some(value) => Some(format!("{}={}", p.name, render_value(value))),
        })
        .collect();

    if rendered.is_empty() {
        action.to_string()
    } else {
        format!("{} ({})", action, rendered.join(", "))
    }
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
