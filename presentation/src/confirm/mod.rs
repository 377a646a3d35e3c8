//! Interactive confirmation for risky commands.
//!
//! Before a moderate or destructive command runs, the operator sees:
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   ⚠️  Confirmation Required [DESTRUCTIVE]
//! ═══════════════════════════════════════════════════════════════
//!
//! Remove package htop
//!
//! Plan:
//!   1. remove_package (dry run)
//!      Would execute:
//!        1. sudo apt remove -y htop
//!
//! Proceed? [y/N]
//! ```
//!
//! Anything other than `y`/`yes` declines. End of input declines too.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::Colorize;
use steward_application::{ConfirmationError, ConfirmationPort, ConfirmationRequest};
use steward_domain::{RiskLevel, StepVerification};

use crate::output::console::ConsoleFormatter;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Terminal-based [`ConfirmationPort`]
pub struct ConsoleConfirmation;

impl ConsoleConfirmation {
    pub fn new() -> Self {
        Self
    }

    /// Render the prompt shown before the question
    pub fn render(request: &ConfirmationRequest<'_>) -> String {
        let color = |s: &str| match request.risk_level {
            RiskLevel::Destructive => s.red().bold(),
            _ => s.yellow().bold(),
        };

        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{}\n", color(RULE)));
        out.push_str(&format!(
            "{} {}\n",
            color("  ⚠️  Confirmation Required"),
            ConsoleFormatter::risk_badge(request.risk_level)
        ));
        out.push_str(&format!("{}\n\n", color(RULE)));
        out.push_str(&format!("{}\n\n", request.description.bold()));

        out.push_str(&format!("{}\n", "Plan:".cyan().bold()));
        out.push_str(&ConsoleFormatter::plan_steps(request.plan));

        let unverified = request
            .plan
            .steps
            .iter()
            .filter(|s| s.verification == StepVerification::Unverified)
            .count();
        if unverified > 0 {
            out.push_str(&format!(
                "\n{}\n",
                format!(
                    "{} of {} steps could not be previewed and will run unverified.",
                    unverified,
                    request.plan.len()
                )
                .yellow()
            ));
        }
        out
    }

    /// Interpret one line of operator input
    pub fn parse_answer(input: &str) -> bool {
        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn read_answer() -> Result<bool, ConfirmationError> {
        print!("{} ", "Proceed? [y/N]".magenta().bold());
        io::stdout()
            .flush()
            .map_err(|e| ConfirmationError::IoError(format!("Failed to flush stdout: {}", e)))?;

        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| ConfirmationError::IoError(format!("Failed to read input: {}", e)))?;
        if read == 0 {
            println!();
            return Ok(false);
        }
        Ok(Self::parse_answer(&input))
    }
}

impl Default for ConsoleConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationPort for ConsoleConfirmation {
    async fn confirm(&self, request: &ConfirmationRequest<'_>) -> Result<bool, ConfirmationError> {
        print!("{}", Self::render(request));
        println!();

        let approved = tokio::task::spawn_blocking(Self::read_answer)
            .await
            .map_err(|_| ConfirmationError::Interrupted)??;

        println!();
        if approved {
            println!("{}", "✓ Confirmed".green());
        } else {
            println!("{}", "✗ Declined; nothing was changed".red());
        }
        Ok(approved)
    }
}
