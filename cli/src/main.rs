//! CLI entrypoint for steward
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use steward_application::{
    AssistantSession, AutoApprove, ConfirmationPort, ExecutionProgress, HybridResolver,
    IntentResolver, ModelResolver, NoProgress, PipelineConfig, ResolverStrategy, Router,
    RuleBasedResolver, SafetyExecutor, ToolRegistry,
};
use steward_domain::ExecutionResult;
use steward_infrastructure::config::expand_home;
use steward_infrastructure::{
    ConfigLoader, FileConfig, InstallationBackend, JsonlAuditLogger, ProcessBackend, Severity,
    TracingTelemetry,
};
use steward_presentation::{
    Cli, ConsoleConfirmation, OutputConfig, OutputFormat, OutputFormatter, ProgressReporter,
    ReplConfig, SessionRepl, formatter_for,
};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit code when the operator declined or cancelled
const EXIT_DECLINED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.resolved_dir().as_deref());
    info!("Starting steward");

    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!(field = %issue.field, "{}", issue.message),
            Severity::Error => eprintln!("config error: {}", issue),
        }
    }

    let output = OutputConfig {
        format: cli
            .output
            .or_else(|| config.output.format.as_deref()?.parse().ok())
            .unwrap_or_default(),
        color: config.output.color,
    };
    output.apply_color();
    let formatter = formatter_for(output.format);

    // === Dependency Injection ===
    let pipeline = config.to_pipeline_config();
    let telemetry = Arc::new(TracingTelemetry::new());
    let registry = Arc::new(build_registry(&config).await);
    let router = Router::new(build_resolver(&config, &pipeline), &pipeline)
        .with_telemetry(telemetry.clone());
    let executor = SafetyExecutor::new(registry, &pipeline).with_telemetry(telemetry.clone());

    let mut session = AssistantSession::new(router, executor);
    if config.audit.enabled
        && let Some(path) = config.audit.resolved_path()
    {
        match JsonlAuditLogger::new(&path) {
            Some(audit) => session = session.with_audit(Arc::new(audit)),
            None => warn!(path = %path.display(), "Audit log unavailable"),
        }
    }
    let session = Arc::new(session);

    let confirm: Arc<dyn ConfirmationPort> = if cli.yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(ConsoleConfirmation::new())
    };

    let code = if cli.list_tools {
        println!("{}", formatter.format_tools(&session.catalog()));
        ExitCode::SUCCESS
    } else if let Some(utterance) = cli.utterance.as_deref() {
        let show_progress = !cli.quiet && output.format == OutputFormat::Text;
        run_once(
            &session,
            utterance,
            confirm.as_ref(),
            formatter.as_ref(),
            cli.plan_only,
            show_progress,
        )
        .await
    } else {
        let defaults = ReplConfig::default();
        let repl_config = ReplConfig {
            show_progress: config.repl.show_progress && !cli.quiet,
            history_file: config
                .repl
                .history_file
                .as_deref()
                .map(expand_home)
                .or(defaults.history_file),
        };

        SessionRepl::new(Arc::clone(&session), confirm, formatter)
            .with_config(repl_config)
            .run()
            .await?;
        ExitCode::SUCCESS
    };

    let stats = telemetry.snapshot();
    debug!(
        routed = stats.routed,
        unresolved = stats.unresolved,
        succeeded = stats.commands_succeeded,
        failed = stats.commands_failed,
        "Session finished"
    );

    Ok(code)
}

/// Build the subscriber: stderr at the requested verbosity, plus a daily
/// log file when `[logging] dir` is set.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "steward.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

async fn build_registry(config: &FileConfig) -> ToolRegistry {
    let registry = ToolRegistry::new();

    if config.installation.enabled {
        let backend = InstallationBackend::new().with_sudo(config.installation.sudo);
        match registry.register_backend(Arc::new(backend)).await {
            Ok(tools) => info!(tools = tools.len(), "Registered installation tools"),
            Err(e) => warn!(error = %e, "Installation backend unavailable"),
        }
    }

    for backend in config.backends.iter().filter(|b| b.enabled) {
        if backend.name.trim().is_empty() || backend.command.trim().is_empty() {
            continue;
        }
        let process = ProcessBackend::new(&backend.name, &backend.command, backend.args.clone());
        match registry.register_backend(Arc::new(process)).await {
            Ok(tools) => info!(backend = %backend.name, tools = tools.len(), "Registered tool server"),
            Err(e) => warn!(backend = %backend.name, error = %e, "Tool server unavailable"),
        }
    }

    registry
}

fn build_resolver(config: &FileConfig, pipeline: &PipelineConfig) -> Arc<dyn IntentResolver> {
    match pipeline.resolver {
        ResolverStrategy::Rules => Arc::new(RuleBasedResolver::new()),
        strategy => match model_resolver(config) {
            Some(model) if strategy == ResolverStrategy::Model => Arc::new(model),
            Some(model) => Arc::new(HybridResolver::new(model, pipeline.hybrid_rule_threshold)),
            None => Arc::new(RuleBasedResolver::new()),
        },
    }
}

#[cfg(feature = "http-classifier")]
fn model_resolver(config: &FileConfig) -> Option<ModelResolver> {
    let endpoint = config.router.model.endpoint.as_deref()?;
    match steward_infrastructure::HttpIntentClassifier::new(endpoint, config.model_timeout()) {
        Ok(classifier) => Some(ModelResolver::new(Arc::new(classifier))),
        Err(e) => {
            warn!(error = %e, "Intent classifier unavailable; using rules");
            None
        }
    }
}

#[cfg(not(feature = "http-classifier"))]
fn model_resolver(_config: &FileConfig) -> Option<ModelResolver> {
    warn!("Built without the http-classifier feature; using rules");
    None
}

async fn run_once(
    session: &AssistantSession,
    utterance: &str,
    confirm: &dyn ConfirmationPort,
    formatter: &dyn OutputFormatter,
    plan_only: bool,
    show_progress: bool,
) -> ExitCode {
    if plan_only {
        let planned = match session.route(utterance).await {
            Ok(command) => session
                .plan_dry_run(&command)
                .await
                .map(|plan| (command, plan)),
            Err(e) => Err(e),
        };
        return match planned {
            Ok((command, plan)) => {
                println!("{}", formatter.format_plan(&command, &plan));
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}", formatter.format_error(utterance, &e));
                ExitCode::FAILURE
            }
        };
    }

    let progress: Box<dyn ExecutionProgress> = if show_progress {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(NoProgress)
    };

    let work = session.handle(utterance, confirm, progress.as_ref());
    tokio::pin!(work);
    let outcome = tokio::select! {
        outcome = &mut work => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Cancelling; the running tool will finish first...");
            session.cancel();
            work.await
        }
    };

    match outcome {
        Ok((command, result)) => {
            println!("{}", formatter.format_result(&command, &result));
            exit_code(&result)
        }
        Err(e) => {
            println!("{}", formatter.format_error(utterance, &e));
            ExitCode::FAILURE
        }
    }
}

fn exit_code(result: &ExecutionResult) -> ExitCode {
    if result.success {
        ExitCode::SUCCESS
    } else if result.was_cancelled() {
        ExitCode::from(EXIT_DECLINED)
    } else {
        ExitCode::FAILURE
    }
}
