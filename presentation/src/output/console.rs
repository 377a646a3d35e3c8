//! Console output formatter for commands, plans and results

use colored::{ColoredString, Colorize};
use steward_application::PipelineError;
use steward_domain::{
    Command, ExecutionPlan, ExecutionResult, RiskLevel, StepVerification, ToolCatalog,
    ToolRunOutcome,
};

use super::formatter::OutputFormatter;

/// Formats pipeline output for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn risk_badge(risk: RiskLevel) -> ColoredString {
        let label = format!("[{}]", risk.as_str().to_uppercase());
        match risk {
            RiskLevel::Safe => label.green(),
            RiskLevel::Moderate => label.yellow().bold(),
            RiskLevel::Destructive => label.red().bold(),
        }
    }

    /// Command header: description, risk and routed tools
    pub fn command_summary(command: &Command) -> String {
        format!(
            "{} {}\n{} {} (confidence {:.2})",
            Self::risk_badge(command.risk_level),
            command.description.bold(),
            "Tools:".dimmed(),
            command.tool_names().join(" → "),
            command.confidence
        )
    }

    /// Numbered plan steps, indented
    pub fn plan_steps(plan: &ExecutionPlan) -> String {
        let mut output = String::new();
        for (i, step) in plan.steps.iter().enumerate() {
            let marker = match step.verification {
                StepVerification::Verified => "dry run".green(),
                StepVerification::Unverified => "not verified".yellow(),
            };
            output.push_str(&format!(
                "  {}. {} ({})\n",
                i + 1,
                step.tool.as_str().cyan().bold(),
                marker
            ));
            output.push_str(&Self::indent(&step.rendered_action, "     "));
            output.push('\n');
            output.push_str(&format!(
                "     {} {}\n",
                "Effect:".dimmed(),
                step.estimated_effect
            ));
        }
        output
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn outcome_line(outcome: &ToolRunOutcome) -> ColoredString {
        match outcome {
            ToolRunOutcome::Succeeded { .. } => "✓ succeeded".green(),
            ToolRunOutcome::Failed { .. } => "✗ failed".red(),
            ToolRunOutcome::TimedOut { after_ms } => {
                format!("✗ timed out after {} ms", after_ms).red()
            }
            ToolRunOutcome::Skipped { reason } => format!("- skipped ({})", reason.as_str()).dimmed(),
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_plan(&self, command: &Command, plan: &ExecutionPlan) -> String {
        let mut output = Self::command_summary(command);
        output.push('\n');
        output.push_str(&Self::section_header("Plan"));
        output.push_str(&Self::plan_steps(plan));
        if command.confirmation_required {
            output.push_str(&format!(
                "\n{}\n",
                "Running this command will ask for confirmation.".yellow()
            ));
        }
        output
    }

    fn format_result(&self, command: &Command, result: &ExecutionResult) -> String {
        let mut output = Self::command_summary(command);
        output.push('\n');

        if result.per_tool_results.len() > 1 {
            output.push_str(&Self::section_header("Tools"));
            for record in &result.per_tool_results {
                let duration = record
                    .duration_ms
                    .map(|ms| format!(" in {} ms", ms))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "  {} {}{}\n",
                    record.tool.as_str().bold(),
                    Self::outcome_line(&record.outcome),
                    duration.dimmed()
                ));
            }
        }

        output.push('\n');
        if result.success {
            output.push_str(&result.output);
            output.push_str(&format!("\n\n{}\n", "✓ Done".green().bold()));
        } else if result.was_cancelled() {
            output.push_str(&format!("{}\n", result.output.yellow()));
        } else {
            output.push_str(&format!("{}\n", result.output.red()));
            if let Some(error) = &result.error
                && !error.recoverable
            {
                output.push_str(&format!(
                    "{}\n",
                    "The system may be partially changed; check it before retrying.".yellow()
                ));
            }
        }
        output
    }

    fn format_error(&self, utterance: &str, error: &PipelineError) -> String {
        let mut output = format!("{} {}\n", "✗".red().bold(), error.to_string().red());
        if let PipelineError::InvalidParameter { missing, .. } = error
            && !missing.is_empty()
        {
            output.push_str(&format!("  Missing: {}\n", missing.join(", ")));
        }
        let suggestions = error.suggestions();
        if !suggestions.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                "Did you mean:".dimmed(),
                suggestions.join(", ")
            ));
        }
        if matches!(error, PipelineError::UnresolvedIntent { .. }) {
            output.push_str(&format!(
                "  {}\n",
                format!("(request was: \"{}\"; /tools lists what I can do)", utterance).dimmed()
            ));
        }
        output
    }

    fn format_tools(&self, catalog: &ToolCatalog) -> String {
        let mut output = format!("{}\n", "Available tools:".cyan().bold());
        for (_, descriptor) in catalog.iter() {
            output.push_str(&format!(
                "  {:<28} {} {}\n",
                descriptor.name.as_str().bold(),
                Self::risk_badge(descriptor.risk_hint),
                descriptor.description
            ));
            let params: Vec<String> = descriptor
                .parameters
                .iter()
                .map(|p| {
                    if p.required {
                        p.name.clone()
                    } else {
                        format!("[{}]", p.name)
                    }
                })
                .collect();
            if !params.is_empty() {
                output.push_str(&format!("  {:<28} {}\n", "", params.join(" ").dimmed()));
            }
        }
        output
    }
}
