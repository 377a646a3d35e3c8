//! CLI command definitions

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON document per command
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// CLI arguments for steward
#[derive(Parser, Debug)]
#[command(name = "steward")]
#[command(author, version, about = "Natural-language system administration with confirmation-gated execution")]
#[command(long_about = r#"
Steward turns a plain-language request into a tool call on this machine.

Every request goes through the same steps:
1. Route: the request is matched to one or more tools and their parameters
2. Dry run: each tool reports what it would do, without changing anything
3. Confirm: anything riskier than a read-only check waits for your approval
4. Execute: the tools run in order; the first failure stops the rest

Configuration files are loaded from (in priority order):
1. STEWARD_* environment variables
2. --config <path>        Explicit config file
3. ./steward.toml         Project-level config
4. ~/.config/steward/config.toml   Global config

Example:
  steward "check requirements for docker"
  steward "install nginx"
  steward --plan-only "setup nginx with ssl for example.com"
  steward              (interactive mode)
"#)]
pub struct Cli {
    /// The request to run (starts interactive mode when omitted)
    pub utterance: Option<String>,

    /// Approve every confirmation prompt without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Route and dry-run only; never execute
    #[arg(long)]
    pub plan_only: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// List the registered tools and exit
    #[arg(long)]
    pub list_tools: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_one_shot() {
        let cli = Cli::parse_from(["steward", "-vv", "--yes", "--output", "json", "install nginx"]);
        assert_eq!(cli.utterance.as_deref(), Some("install nginx"));
        assert!(cli.yes);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_no_utterance_means_interactive() {
        let cli = Cli::parse_from(["steward"]);
        assert!(cli.utterance.is_none());
        assert!(!cli.plan_only);
    }
}
