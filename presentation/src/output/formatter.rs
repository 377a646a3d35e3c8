//! Output formatter trait

use steward_application::PipelineError;
use steward_domain::{Command, ExecutionPlan, ExecutionResult, ToolCatalog};

use super::console::ConsoleFormatter;
use super::json::JsonFormatter;
use crate::cli::commands::OutputFormat;

/// Trait for rendering pipeline output
pub trait OutputFormatter: Send + Sync {
    /// A routed command together with its dry-run plan (`--plan-only`)
    fn format_plan(&self, command: &Command, plan: &ExecutionPlan) -> String;

    /// The final result of one command
    fn format_result(&self, command: &Command, result: &ExecutionResult) -> String;

    /// A request that could not be routed or planned
    fn format_error(&self, utterance: &str, error: &PipelineError) -> String;

    /// The registered tools
    fn format_tools(&self, catalog: &ToolCatalog) -> String;
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
