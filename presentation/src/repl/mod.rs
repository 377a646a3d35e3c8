//! Interactive session loop

use std::sync::Arc;

use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use steward_application::{
    AssistantSession, ConfirmationPort, ExecutionProgress, NoProgress, PipelineError,
};
use steward_domain::{Command, ExecutionResult};

use crate::config::ReplConfig;
use crate::output::formatter::OutputFormatter;
use crate::progress::reporter::ProgressReporter;

const HISTORY_SIZE: usize = 1000;

/// A line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Empty,
    Help,
    Tools,
    /// Dry run only, never executes
    Plan(&'a str),
    Quit,
    Unknown(&'a str),
    Utterance(&'a str),
}

impl<'a> ReplInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplInput::Empty;
        }
        if !line.starts_with('/') {
            return ReplInput::Utterance(line);
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "/quit" | "/exit" | "/q" => ReplInput::Quit,
            "/help" | "/h" | "/?" => ReplInput::Help,
            "/tools" | "/t" => ReplInput::Tools,
            "/plan" | "/p" if !rest.trim().is_empty() => ReplInput::Plan(rest.trim()),
            _ => ReplInput::Unknown(cmd),
        }
    }
}

/// Interactive assistant REPL
pub struct SessionRepl {
    session: Arc<AssistantSession>,
    confirm: Arc<dyn ConfirmationPort>,
    formatter: Box<dyn OutputFormatter>,
    config: ReplConfig,
}

impl SessionRepl {
    pub fn new(
        session: Arc<AssistantSession>,
        confirm: Arc<dyn ConfirmationPort>,
        formatter: Box<dyn OutputFormatter>,
    ) -> Self {
        Self {
            session,
            confirm,
            formatter,
            config: ReplConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.config.history_file else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_SIZE, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                eprintln!("{} history disabled: {}", "warning:".yellow(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("steward".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            let line = match editor.read_line(&prompt)? {
                Signal::Success(line) => line,
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            };

            match ReplInput::parse(&line) {
                ReplInput::Empty => {}
                ReplInput::Quit => {
                    println!("Bye!");
                    break;
                }
                ReplInput::Help => self.print_help(),
                ReplInput::Tools => {
                    println!("{}", self.formatter.format_tools(&self.session.catalog()));
                }
                ReplInput::Plan(utterance) => self.plan(utterance).await,
                ReplInput::Unknown(cmd) => {
                    println!("Unknown command: {}", cmd);
                    println!("Type /help for available commands");
                }
                ReplInput::Utterance(utterance) => self.process(utterance).await,
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│       steward - system administration       │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "{} tools loaded, resolver: {}",
            self.session.catalog().len(),
            self.session.resolver_name()
        );
        println!("Describe what you want done, e.g. \"install nginx\".");
        println!("Changes are previewed and need your confirmation. Ctrl-C stops a running command.");
        println!();
        self.print_help();
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  /tools, /t          - List available tools");
        println!("  /plan <request>     - Preview a request without running it");
        println!("  /help, /h, /?       - Show this help");
        println!("  /quit, /exit, /q    - Exit");
        println!();
    }

    async fn plan(&self, utterance: &str) {
        let planned = async {
            let command = self.session.route(utterance).await?;
            let plan = self.session.plan_dry_run(&command).await?;
            Ok::<_, PipelineError>((command, plan))
        };
        match planned.await {
            Ok((command, plan)) => println!("{}", self.formatter.format_plan(&command, &plan)),
            Err(e) => println!("{}", self.formatter.format_error(utterance, &e)),
        }
    }

    async fn process(&self, utterance: &str) {
        println!();
        let progress: Box<dyn ExecutionProgress> = if self.config.show_progress {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(NoProgress)
        };

        match self.handle(utterance, progress.as_ref()).await {
            Ok((command, result)) => {
                println!("{}", self.formatter.format_result(&command, &result));
            }
            Err(e) => println!("{}", self.formatter.format_error(utterance, &e)),
        }
    }

    /// Handle one utterance; Ctrl-C cancels before the next tool starts
    async fn handle(
        &self,
        utterance: &str,
        progress: &dyn ExecutionProgress,
    ) -> Result<(Command, ExecutionResult), PipelineError> {
        let work = self
            .session
            .handle(utterance, self.confirm.as_ref(), progress);
        tokio::pin!(work);

        tokio::select! {
            outcome = &mut work => outcome,
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "Cancelling; the running tool will finish first...".yellow());
                self.session.cancel();
                work.await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse("/q"), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/tools"), ReplInput::Tools);
        assert_eq!(
            ReplInput::parse("/plan remove htop"),
            ReplInput::Plan("remove htop")
        );
        assert_eq!(ReplInput::parse("/plan"), ReplInput::Unknown("/plan"));
        assert_eq!(ReplInput::parse("/reboot"), ReplInput::Unknown("/reboot"));
        assert_eq!(
            ReplInput::parse(" install nginx "),
            ReplInput::Utterance("install nginx")
        );
    }
}
