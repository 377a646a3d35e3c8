//! Presentation layer for steward
//!
//! This crate contains CLI definitions, output formatters, the interactive
//! confirmation prompt, progress reporters and the REPL.

pub mod cli;
pub mod config;
pub mod confirm;
pub mod output;
pub mod progress;
pub mod repl;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use config::{OutputConfig, ReplConfig};
pub use confirm::ConsoleConfirmation;
pub use output::console::ConsoleFormatter;
pub use output::formatter::{OutputFormatter, formatter_for};
pub use output::json::JsonFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use repl::SessionRepl;
