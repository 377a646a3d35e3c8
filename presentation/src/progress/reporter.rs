//! Progress reporting while commands execute

use std::sync::Mutex;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use steward_application::ExecutionProgress;
use steward_domain::{ExecutionPhase, ToolName, ToolRunOutcome};

/// Spinner per running tool
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn phase_message(phase: ExecutionPhase) -> Option<&'static str> {
        match phase {
            ExecutionPhase::DryRun => Some("Previewing changes..."),
            ExecutionPhase::ConfirmPending => Some("Waiting for confirmation"),
            _ => None,
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionProgress for ProgressReporter {
    fn on_phase(&self, phase: ExecutionPhase) {
        // The confirmation prompt needs a clean terminal
        if phase == ExecutionPhase::ConfirmPending || phase.is_terminal() {
            self.clear();
            return;
        }
        if let Some(message) = Self::phase_message(phase) {
            println!("{} {}", "->".cyan(), message.dimmed());
        }
    }

    fn on_tool_start(&self, tool: &ToolName, index: usize, total: usize) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("[{}/{}]", index + 1, total));
        pb.set_message(tool.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.bar.lock()
            && let Some(previous) = slot.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_tool_complete(&self, tool: &ToolName, outcome: &ToolRunOutcome) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        if let Some(pb) = slot.take() {
            let status = match outcome {
                ToolRunOutcome::Succeeded { .. } => format!("{} {}", "✓".green(), tool),
                ToolRunOutcome::TimedOut { .. } => format!("{} {} (timed out)", "✗".red(), tool),
                _ => format!("{} {}", "✗".red(), tool),
            };
            pb.finish_with_message(status);
        }
    }
}

/// Simple text-based progress (no spinner)
pub struct SimpleProgress;

impl ExecutionProgress for SimpleProgress {
    fn on_phase(&self, phase: ExecutionPhase) {
        if let Some(message) = ProgressReporter::phase_message(phase) {
            println!("{} {}", "->".cyan(), message);
        }
    }

    fn on_tool_start(&self, tool: &ToolName, index: usize, total: usize) {
        println!(
            "{} [{}/{}] {}",
            "->".cyan(),
            index + 1,
            total,
            tool.as_str().bold()
        );
    }

    fn on_tool_complete(&self, tool: &ToolName, outcome: &ToolRunOutcome) {
        match outcome {
            ToolRunOutcome::Succeeded { .. } => println!("  {} {}", "✓".green(), tool),
            _ => println!("  {} {} (failed)", "✗".red(), tool),
        }
    }
}
