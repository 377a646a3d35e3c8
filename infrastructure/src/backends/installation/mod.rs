//! In-process installation backend
//!
//! Serves package, web server, Oracle Database and service management tools.
//! Every tool first builds an [`Operation`], the ordered list of host
//! commands it would run:
//!
//! - `DryRun` renders the operation ("Would execute: ...") and runs nothing
//! - `Execute` runs the commands in order through the [`CommandRunner`] and
//!   stops at the first non-zero exit
//!
//! Preconditions (package manager present, enough memory for the requested
//! Oracle allocation) are checked while building the operation, so a dry
//! run reports them before anything is confirmed.

mod catalog;
mod packages;
mod requirements;

pub use catalog::{
    CHECK_SYSTEM_REQUIREMENTS, INSTALL_ORACLE_DATABASE, INSTALL_PACKAGE, MANAGE_SERVICE,
    REMOVE_PACKAGE, SETUP_WEB_SERVER,
};
pub use packages::PackageManager;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use steward_domain::{BackendError, ToolBackend, ToolDescriptor, ToolMode, ToolRequest, ToolResponse};
use tracing::{debug, info, warn};

use super::host::{
    CommandLocator, CommandRunner, CommandSpec, ProcessRunner, SysinfoProbe, SystemProbe,
    WhichLocator,
};
use catalog::{ORACLE_VERSIONS, SERVER_TYPES, SERVICE_ACTIONS};
use packages::validate_package_name;

pub const BACKEND_ID: &str = "installation";

/// What a tool would do, before it does it
#[derive(Debug, Clone)]
struct Operation {
    summary: String,
    notes: Vec<String>,
    steps: Vec<CommandSpec>,
    effect: String,
}

impl Operation {
    fn new(summary: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            notes: Vec::new(),
            steps: Vec::new(),
            effect: effect.into(),
        }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    fn step(mut self, spec: CommandSpec) -> Self {
        self.steps.push(spec);
        self
    }

    fn commands(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }

    fn render_dry_run(&self) -> ToolResponse {
        let mut text = self.summary.clone();
        if !self.notes.is_empty() {
            text.push_str("\n\n");
            text.push_str(
                &self
                    .notes
                    .iter()
                    .map(|n| format!("- {}", n))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        text.push_str("\n\nWould execute:\n");
        text.push_str(
            &self
                .commands()
                .iter()
                .enumerate()
                .map(|(i, c)| format!("  {}. {}", i + 1, c))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        text.push_str("\n\nThis is a dry run; no changes were made.");

        ToolResponse::text(text).with_structured(json!({
            "effect": self.effect,
            "commands": self.commands(),
        }))
    }
}

pub struct InstallationBackend {
    runner: Arc<dyn CommandRunner>,
    locator: Arc<dyn CommandLocator>,
    probe: Arc<dyn SystemProbe>,
    sudo: bool,
}

impl InstallationBackend {
    pub fn new() -> Self {
        Self {
            runner: Arc::new(ProcessRunner),
            locator: Arc::new(WhichLocator),
            probe: Arc::new(SysinfoProbe),
            sudo: true,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn CommandLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Whether privileged commands are prefixed with `sudo`
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    fn resolve_manager(&self, requested: Option<&str>) -> Result<PackageManager, String> {
        match requested {
            None | Some("auto") => PackageManager::detect(self.locator.as_ref()).ok_or_else(|| {
                "No supported package manager found (tried apt, yum, dnf, pacman, brew, snap)"
                    .to_string()
            }),
            Some(name) => {
                let manager = PackageManager::parse(name)
                    .ok_or_else(|| format!("Unsupported package manager: {}", name))?;
                if self.locator.exists(manager.as_str()) {
                    Ok(manager)
                } else {
                    Err(format!("{} is not installed on this host", manager))
                }
            }
        }
    }

    fn privileged(&self, spec: CommandSpec) -> CommandSpec {
        spec.elevated(self.sudo)
    }

    fn plan_install_package(&self, request: &ToolRequest) -> Result<Operation, String> {
        let package = request
            .get_string("package")
            .ok_or("package is required")?;
        validate_package_name(package)?;
        let manager = self.resolve_manager(request.get_string("manager"))?;
        let version = request.get_string("version");
        let options = request.get_string_list("options");

        let install = manager
            .install(package, version, &options)
            .elevated(self.sudo && manager.needs_root());
        let mut op = Operation::new(
            format!(
                "Install {}{} using {}",
                package,
                version.map(|v| format!(" (version {})", v)).unwrap_or_default(),
                manager
            ),
            format!("Installs {} and its dependencies", package),
        )
        .step(install);
        if version.is_some() && !manager.pins_versions() {
            op = op.note(format!(
                "{} cannot pin versions; the repository version will be installed",
                manager
            ));
        }
        Ok(op)
    }

    fn plan_remove_package(&self, request: &ToolRequest) -> Result<Operation, String> {
        let package = request
            .get_string("package")
            .ok_or("package is required")?;
        validate_package_name(package)?;
        let manager = self.resolve_manager(request.get_string("manager"))?;
        let purge = request.get_bool("purge").unwrap_or(false);

        let effect = if purge {
            format!("Removes {} and deletes its configuration files", package)
        } else {
            format!("Removes {}; configuration files are kept", package)
        };
        Ok(Operation::new(
            format!("Remove {} using {}", package, manager),
            effect,
        )
        .step(
            manager
                .remove(package, purge)
                .elevated(self.sudo && manager.needs_root()),
        ))
    }

    fn plan_oracle(&self, request: &ToolRequest) -> Result<Operation, String> {
        let version = request.get_string("version").unwrap_or("21c");
        if !ORACLE_VERSIONS.contains(&version) {
            return Err(format!(
                "Unsupported Oracle Database version '{}' (expected one of {})",
                version,
                ORACLE_VERSIONS.join(", ")
            ));
        }
        let memory_gb = request.get_f64("memory_gb").unwrap_or(8.0);
        let storage_gb = request.get_f64("storage_gb").unwrap_or(50.0);
        let auto_start = request.get_bool("auto_start").unwrap_or(true);
        let install_path = request.get_string("install_path").unwrap_or("/opt/oracle");
        if !install_path.starts_with('/') {
            return Err(format!("install_path must be absolute, got '{}'", install_path));
        }

        let facts = self.probe.facts();
        let installed_gb = facts.total_memory_gb.round();
        if installed_gb < memory_gb {
            return Err(format!(
                "Insufficient memory for Oracle Database installation\n\nRequired: {} GB\nAvailable: {} GB\n\nIncrease memory or lower memory_gb.",
                memory_gb, installed_gb
            ));
        }

        let manager = self.resolve_manager(None)?;
        if !manager.is_rpm() {
            return Err(format!(
                "Oracle Database is distributed as RPM packages; dnf or yum is required (found {})",
                manager
            ));
        }

        let edition = match version {
            "19c" => "ee",
            "23c" => "free",
            _ => "xe",
        };
        let unit = format!("oracle-{}-{}", edition, version);
        let package = format!("oracle-database-{}-{}", edition, version);

        let mut op = Operation::new(
            format!("Oracle Database {} installation plan", version),
            format!(
                "Creates the oracle user and groups, installs Oracle Database {} into {} and configures a database{}",
                version,
                install_path,
                if auto_start { " that starts on boot" } else { "" }
            ),
        )
        .note(format!(
            "Memory: {} GB installed, {} GB requested",
            installed_gb, memory_gb
        ))
        .note(format!("Storage: {} GB requested at {}", storage_gb, install_path))
        .note(format!("Platform: {} {}", facts.os, facts.arch));

        match facts.available_gb_for(install_path) {
            Some(available) if available < storage_gb => {
                op = op.note(format!(
                    "Warning: only {:.0} GB free on the filesystem holding {}",
                    available, install_path
                ));
            }
            Some(_) => {}
            None => {
                op = op.note(format!("Free space at {} could not be determined", install_path));
            }
        }

        op = op
            .step(self.privileged(CommandSpec::new("groupadd", ["-f", "oinstall"])))
            .step(self.privileged(CommandSpec::new("groupadd", ["-f", "dba"])))
            .step(self.privileged(CommandSpec::new(
                "sh",
                ["-c", "id -u oracle >/dev/null 2>&1 || useradd -m -g oinstall -G dba oracle"],
            )))
            .step(self.privileged(CommandSpec::new("mkdir", ["-p", install_path])))
            .step(self.privileged(CommandSpec::new(
                "chown",
                ["-R", "oracle:oinstall", install_path],
            )))
            .step(self.privileged(manager.install(&package, None, &[])))
            .step(self.privileged(CommandSpec::new(
                format!("/etc/init.d/{}", unit),
                ["configure"],
            )));
        if auto_start {
            op = op.step(self.privileged(CommandSpec::new("systemctl", ["enable", unit.as_str()])));
        }
        Ok(op)
    }

    fn plan_web_server(&self, request: &ToolRequest) -> Result<Operation, String> {
        let server_type = request
            .get_string("server_type")
            .ok_or("server_type is required")?;
        if !SERVER_TYPES.contains(&server_type) {
            return Err(format!(
                "Unsupported server type '{}' (expected nginx, apache or both)",
                server_type
            ));
        }
        let ssl = request.get_bool("ssl_enabled").unwrap_or(true);
        let domain = request.get_string("domain");
        let auto_start = request.get_bool("auto_start").unwrap_or(true);
        let manager = self.resolve_manager(None)?;
        let elevate = self.sudo && manager.needs_root();

        // (package, service unit, certbot plugin)
        let mut servers: Vec<(&str, &str, &str)> = Vec::new();
        if matches!(server_type, "nginx" | "both") {
            servers.push(("nginx", "nginx", "nginx"));
        }
        if matches!(server_type, "apache" | "both") {
            let apache = manager.apache_package();
            servers.push((apache, apache, "apache"));
        }
        let packages: Vec<&str> = servers.iter().map(|(p, _, _)| *p).collect();

        let mut op = Operation::new(
            format!("Web server setup: {}", server_type),
            format!(
                "Installs {}{}{}",
                packages.join(" and "),
                match (ssl, domain) {
                    (true, Some(d)) => format!(", requests a TLS certificate for {}", d),
                    _ => String::new(),
                },
                if auto_start { ", starts it on boot" } else { "" }
            ),
        )
        .note(format!("SSL/TLS: {}", if ssl { "enabled" } else { "disabled" }))
        .note(format!(
            "Auto-start: {}",
            if auto_start { "enabled" } else { "disabled" }
        ));

        if let Some((first, rest)) = packages.split_first() {
            op = op.step(manager.install_all(first, rest).elevated(elevate));
        }

        match (ssl, domain) {
            (true, Some(domain)) => {
                op = op
                    .note(format!("Domain: {}", domain))
                    .step(manager.install("certbot", None, &[]).elevated(elevate));
                for (_, _, plugin) in &servers {
                    op = op.step(self.privileged(CommandSpec::new(
                        "certbot",
                        [
                            format!("--{}", plugin),
                            "-d".to_string(),
                            domain.to_string(),
                            "--non-interactive".to_string(),
                            "--agree-tos".to_string(),
                            "--register-unsafely-without-email".to_string(),
                            "--redirect".to_string(),
                        ],
                    )));
                }
            }
            (true, None) => {
                op = op.note("No domain given; skipping certificate setup");
            }
            (false, _) => {}
        }

        if auto_start {
            for &(_, unit, _) in &servers {
                let spec = if manager == PackageManager::Brew {
                    CommandSpec::new("brew", ["services", "start", unit])
                } else {
                    self.privileged(CommandSpec::new("systemctl", ["enable", "--now", unit]))
                };
                op = op.step(spec);
            }
        }
        Ok(op)
    }

    fn plan_service(&self, request: &ToolRequest) -> Result<Operation, String> {
        let service = request
            .get_string("service")
            .ok_or("service is required")?;
        if service.starts_with('-')
            || !service
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | ':'))
        {
            return Err(format!("'{}' is not a valid service name", service));
        }
        let action = request.get_string("action").ok_or("action is required")?;
        if !SERVICE_ACTIONS.contains(&action) {
            return Err(format!("Unsupported service action '{}'", action));
        }
        if !self.locator.exists("systemctl") {
            return Err("systemctl not found; service management needs systemd".to_string());
        }

        let op = if action == "status" {
            Operation::new(
                format!("Show status of {}", service),
                "Read-only; the system is not changed",
            )
            .step(CommandSpec::new("systemctl", ["status", service, "--no-pager"]))
        } else {
            Operation::new(
                format!("{} {}", capitalize(action), service),
                format!("Runs systemctl {} {}", action, service),
            )
            .step(self.privileged(CommandSpec::new("systemctl", [action, service])))
        };
        Ok(op)
    }

    fn check_requirements(&self, request: &ToolRequest) -> ToolResponse {
        let Some(software) = request.get_string("software") else {
            return ToolResponse::error("software is required");
        };
        let detailed = request.get_bool("detailed").unwrap_or(false);

        if request.mode.is_dry_run() {
            return ToolResponse::text(format!(
                "Would inspect memory, CPUs, platform{} for {}",
                if detailed { ", disks and package manager" } else { "" },
                software
            ))
            .with_structured(json!({"effect": "Read-only; the system is not changed"}));
        }

        let facts = self.probe.facts();
        let manager = PackageManager::detect(self.locator.as_ref());
        let report = requirements::report(
            software,
            &facts,
            detailed,
            manager.as_ref().map(PackageManager::as_str),
        );
        ToolResponse::text(report.text).with_structured(json!({
            "software": software,
            "meets_requirements": report.meets,
        }))
    }

    async fn run(&self, tool: &str, op: Operation) -> ToolResponse {
        let total = op.steps.len();
        let mut transcript = Vec::with_capacity(total);

        for (index, step) in op.steps.iter().enumerate() {
            info!(tool, step = index + 1, total, command = %step, "Running step");
            match self.runner.run(step).await {
                Ok(output) if output.success() => {
                    let combined = output.combined();
                    transcript.push(if combined.is_empty() {
                        format!("$ {}", step)
                    } else {
                        format!("$ {}\n{}", step, combined)
                    });
                }
                Ok(output) => {
                    warn!(tool, command = %step, status = ?output.status, "Step failed");
                    return ToolResponse::error(format!(
                        "Step {}/{} failed (exit {}): {}\n{}\n\nCompleted steps: {}",
                        index + 1,
                        total,
                        output
                            .status
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "signal".to_string()),
                        step,
                        output.combined(),
                        index
                    ))
                    .with_structured(json!({"completed_steps": index, "total_steps": total}));
                }
                Err(e) => {
                    warn!(tool, command = %step, error = %e, "Could not start step");
                    return ToolResponse::error(format!(
                        "Could not run '{}': {}\n\nCompleted steps: {}",
                        step, e, index
                    ))
                    .with_structured(json!({"completed_steps": index, "total_steps": total}));
                }
            }
        }

        ToolResponse::text(format!("{}: done\n\n{}", op.summary, transcript.join("\n\n")))
            .with_structured(json!({"completed_steps": total, "total_steps": total}))
    }
}

impl Default for InstallationBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl ToolBackend for InstallationBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    async fn describe(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        catalog::descriptors().map_err(|e| BackendError::DiscoveryFailed(e.to_string()))
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ToolResponse, BackendError> {
        let tool = request.tool_name.as_str();
        debug!(tool, mode = %request.mode, "Installation backend invoked");

        let planned = match tool {
            INSTALL_PACKAGE => self.plan_install_package(request),
            REMOVE_PACKAGE => self.plan_remove_package(request),
            INSTALL_ORACLE_DATABASE => self.plan_oracle(request),
            SETUP_WEB_SERVER => self.plan_web_server(request),
            MANAGE_SERVICE => self.plan_service(request),
            CHECK_SYSTEM_REQUIREMENTS => return Ok(self.check_requirements(request)),
            other => return Err(BackendError::UnknownTool(other.to_string())),
        };

        let op = match planned {
            Ok(op) => op,
            Err(rejection) => return Ok(ToolResponse::error(rejection)),
        };

        Ok(match request.mode {
            ToolMode::DryRun => op.render_dry_run(),
            ToolMode::Execute => self.run(tool, op).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::host::{CommandOutput, SystemFacts};
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use steward_application::{
        ConfirmationError, ConfirmationPort, ConfirmationRequest, PipelineConfig, PipelineError,
        Router, RuleBasedResolver, SafetyExecutor, ToolRegistry,
    };
    use steward_domain::{Command, ContentItem, RiskLevel, ToolArguments, ToolName};

    struct OnPath(HashSet<&'static str>);

    impl CommandLocator for OnPath {
        fn exists(&self, program: &str) -> bool {
            self.0.contains(program)
        }
    }

    struct FixedFacts(f64);

    impl SystemProbe for FixedFacts {
        fn facts(&self) -> SystemFacts {
            SystemFacts {
                os: "linux".into(),
                arch: "x86_64".into(),
                hostname: "test".into(),
                cpus: 4,
                total_memory_gb: self.0,
                available_memory_gb: self.0 / 2.0,
                disks: vec![("/".into(), 200.0, 120.0)],
                uptime_hours: 1,
            }
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        ran: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
            let rendered = spec.to_string();
            self.ran.lock().unwrap().push(rendered.clone());
            if self.fail_on.is_some_and(|needle| rendered.contains(needle)) {
                return Ok(CommandOutput {
                    status: Some(100),
                    stdout: String::new(),
                    stderr: "E: failure".into(),
                });
            }
            Ok(CommandOutput {
                status: Some(0),
                stdout: "ok".into(),
                stderr: String::new(),
            })
        }
    }

    fn backend(on_path: &[&'static str], memory_gb: f64) -> (InstallationBackend, Arc<RecordingRunner>) {
        backend_with(on_path, memory_gb, RecordingRunner::default())
    }

    fn backend_with(
        on_path: &[&'static str],
        memory_gb: f64,
        runner: RecordingRunner,
    ) -> (InstallationBackend, Arc<RecordingRunner>) {
        let runner = Arc::new(runner);
        let backend = InstallationBackend::new()
            .with_runner(runner.clone())
            .with_locator(Arc::new(OnPath(on_path.iter().copied().collect())))
            .with_probe(Arc::new(FixedFacts(memory_gb)));
        (backend, runner)
    }

    fn request(tool: &str, args: Value, mode: ToolMode) -> ToolRequest {
        let arguments: ToolArguments = args.as_object().cloned().unwrap_or_default();
        ToolRequest::new(ToolName::new(tool).unwrap(), arguments, mode)
    }

    fn structured(response: &ToolResponse) -> Value {
        response
            .content
            .iter()
            .find_map(|c| match c {
                ContentItem::Structured(v) => Some(v.clone()),
                ContentItem::Text(_) => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_never_touches_the_host() {
        let (backend, runner) = backend(&["apt", "systemctl"], 16.0);
        for (tool, args) in [
            (INSTALL_PACKAGE, json!({"package": "nginx", "manager": "auto"})),
            (REMOVE_PACKAGE, json!({"package": "nginx", "purge": true})),
            (SETUP_WEB_SERVER, json!({"server_type": "both", "domain": "example.com"})),
            (MANAGE_SERVICE, json!({"service": "nginx", "action": "restart"})),
            (CHECK_SYSTEM_REQUIREMENTS, json!({"software": "docker"})),
        ] {
            let response = backend
                .invoke(&request(tool, args, ToolMode::DryRun))
                .await
                .unwrap();
            assert!(!response.is_error, "{tool}: {}", response.render());
        }
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_package_dry_run_renders_command() {
        let (backend, _runner) = backend(&["dnf", "yum"], 16.0);
        let response = backend
            .invoke(&request(
                INSTALL_PACKAGE,
                json!({"package": "nginx", "version": "1.24", "manager": "auto"}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();

        let text = response.first_text().unwrap();
        assert!(text.starts_with("Install nginx (version 1.24) using dnf"));
        assert!(text.contains("1. sudo dnf install -y nginx-1.24"));
        assert_eq!(structured(&response)["commands"][0], "sudo dnf install -y nginx-1.24");
        assert_eq!(
            structured(&response)["effect"],
            "Installs nginx and its dependencies"
        );
    }

    #[tokio::test]
    async fn test_execute_runs_the_rendered_commands() {
        let (backend, runner) = backend(&["apt"], 16.0);
        let response = backend
            .invoke(&request(
                INSTALL_PACKAGE,
                json!({"package": "nginx"}),
                ToolMode::Execute,
            ))
            .await
            .unwrap();

        assert!(!response.is_error);
        assert_eq!(*runner.ran.lock().unwrap(), vec!["sudo apt install -y nginx"]);
    }

    #[tokio::test]
    async fn test_missing_package_manager_is_a_tool_error() {
        let (backend, _runner) = backend(&[], 16.0);
        let response = backend
            .invoke(&request(
                INSTALL_PACKAGE,
                json!({"package": "nginx", "manager": "auto"}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();
        assert!(response.is_error);
        assert!(response.render().contains("No supported package manager"));
    }

    #[tokio::test]
    async fn test_option_like_package_name_is_rejected() {
        let (backend, runner) = backend(&["apt"], 16.0);
        let response = backend
            .invoke(&request(
                INSTALL_PACKAGE,
                json!({"package": "--reinstall"}),
                ToolMode::Execute,
            ))
            .await
            .unwrap();
        assert!(response.is_error);
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oracle_dry_run_rejects_insufficient_memory() {
        let (backend, _runner) = backend(&["dnf"], 4.0);
        let response = backend
            .invoke(&request(
                INSTALL_ORACLE_DATABASE,
                json!({"version": "21c", "memory_gb": 8}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();
        assert!(response.is_error);
        let text = response.render();
        assert!(text.contains("Required: 8 GB"));
        assert!(text.contains("Available: 4 GB"));
    }

    #[tokio::test]
    async fn test_oracle_plan_on_rpm_host() {
        let (backend, _runner) = backend(&["dnf"], 32.0);
        let response = backend
            .invoke(&request(
                INSTALL_ORACLE_DATABASE,
                json!({"version": "23c", "memory_gb": 16, "storage_gb": 500, "auto_start": false, "install_path": "/u01/app"}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();

        assert!(!response.is_error);
        let commands = structured(&response)["commands"].clone();
        let commands: Vec<&str> = commands
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(commands.contains(&"sudo dnf install -y oracle-database-free-23c"));
        assert!(commands.contains(&"sudo mkdir -p /u01/app"));
        assert!(!commands.iter().any(|c| c.contains("systemctl enable")));
        assert!(response.render().contains("Warning: only 120 GB free"));
    }

    #[tokio::test]
    async fn test_oracle_requires_rpm_manager() {
        let (backend, _runner) = backend(&["apt"], 32.0);
        let response = backend
            .invoke(&request(INSTALL_ORACLE_DATABASE, json!({}), ToolMode::DryRun))
            .await
            .unwrap();
        assert!(response.is_error);
        assert!(response.render().contains("dnf or yum is required"));
    }

    #[tokio::test]
    async fn test_web_server_with_domain_adds_certbot() {
        let (backend, _runner) = backend(&["apt"], 8.0);
        let response = backend
            .invoke(&request(
                SETUP_WEB_SERVER,
                json!({"server_type": "apache", "ssl_enabled": true, "domain": "example.com", "auto_start": true}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();

        let commands = structured(&response)["commands"].clone();
        assert_eq!(commands[0], "sudo apt install -y apache2");
        assert_eq!(commands[1], "sudo apt install -y certbot");
        assert!(commands[2].as_str().unwrap().starts_with("sudo certbot --apache -d example.com"));
        assert_eq!(commands[3], "sudo systemctl enable --now apache2");
    }

    #[tokio::test]
    async fn test_web_server_without_domain_skips_tls() {
        let (backend, _runner) = backend(&["apt"], 8.0);
        let response = backend
            .invoke(&request(
                SETUP_WEB_SERVER,
                json!({"server_type": "nginx", "ssl_enabled": true, "auto_start": false}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();
        assert!(response.render().contains("skipping certificate setup"));
        assert_eq!(structured(&response)["commands"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_step_stops_and_reports_progress() {
        let runner = RecordingRunner {
            fail_on: Some("certbot --nginx"),
            ..Default::default()
        };
        let (backend, runner) = backend_with(&["apt"], 8.0, runner);
        let response = backend
            .invoke(&request(
                SETUP_WEB_SERVER,
                json!({"server_type": "nginx", "ssl_enabled": true, "domain": "example.com", "auto_start": true}),
                ToolMode::Execute,
            ))
            .await
            .unwrap();

        assert!(response.is_error);
        assert_eq!(structured(&response)["completed_steps"], 2);
        // systemctl enable never ran
        assert_eq!(runner.ran.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_service_status_needs_no_sudo() {
        let (backend, _runner) = backend(&["systemctl"], 8.0);
        let response = backend
            .invoke(&request(
                MANAGE_SERVICE,
                json!({"service": "sshd", "action": "status"}),
                ToolMode::DryRun,
            ))
            .await
            .unwrap();
        assert_eq!(
            structured(&response)["commands"][0],
            "systemctl status sshd --no-pager"
        );
    }

    #[tokio::test]
    async fn test_requirements_execute_reports_facts() {
        let (backend, runner) = backend(&["apt"], 16.0);
        let response = backend
            .invoke(&request(
                CHECK_SYSTEM_REQUIREMENTS,
                json!({"software": "oracle", "detailed": true}),
                ToolMode::Execute,
            ))
            .await
            .unwrap();
        assert!(!response.is_error);
        assert_eq!(structured(&response)["meets_requirements"], true);
        assert!(response.render().contains("Package manager: apt"));
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (backend, _runner) = backend(&[], 8.0);
        let err = backend
            .invoke(&request("reboot_host", json!({}), ToolMode::DryRun))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownTool(_)));
    }

    #[derive(Default)]
    struct CountingApproval(AtomicUsize);

    impl CountingApproval {
        fn asked(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfirmationPort for CountingApproval {
        async fn confirm(
            &self,
            _request: &ConfirmationRequest<'_>,
        ) -> Result<bool, ConfirmationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    /// Registry serving the shipped tools on an apt host
    async fn shipped_registry() -> (Arc<ToolRegistry>, Arc<RecordingRunner>) {
        let (backend, runner) = backend(&["apt", "systemctl"], 16.0);
        let registry = Arc::new(ToolRegistry::new());
        let registered = registry.register_backend(Arc::new(backend)).await.unwrap();
        assert_eq!(registered.len(), 6);
        (registry, runner)
    }

    async fn route(registry: &ToolRegistry, utterance: &str) -> Result<Command, PipelineError> {
        Router::new(Arc::new(RuleBasedResolver::new()), &PipelineConfig::default())
            .route(utterance, &registry.snapshot())
            .await
    }

    fn args(command: &Command) -> &ToolArguments {
        &command.params[&command.tools[0]]
    }

    #[tokio::test]
    async fn test_install_routes_and_runs_after_confirmation() {
        let (registry, runner) = shipped_registry().await;

        let command = route(&registry, "install nginx").await.unwrap();
        assert_eq!(command.intent, INSTALL_PACKAGE);
        assert_eq!(args(&command)["package"], "nginx");
        assert_eq!(args(&command)["manager"], "auto");
        assert_eq!(command.risk_level, RiskLevel::Moderate);
        assert!(command.confirmation_required);
        assert!(command.missing.is_empty());

        let approval = CountingApproval::default();
        let result = SafetyExecutor::new(registry, &PipelineConfig::default())
            .execute(&command, &approval)
            .await;
        assert!(result.success, "{}", result.output);
        assert_eq!(approval.asked(), 1);
        assert_eq!(*runner.ran.lock().unwrap(), vec!["sudo apt install -y nginx"]);
    }

    #[tokio::test]
    async fn test_requirements_check_runs_without_confirmation() {
        let (registry, runner) = shipped_registry().await;

        let command = route(&registry, "check requirements for docker").await.unwrap();
        assert_eq!(command.intent, CHECK_SYSTEM_REQUIREMENTS);
        assert_eq!(args(&command)["software"], "docker");
        assert_eq!(args(&command)["detailed"], false);
        assert_eq!(command.risk_level, RiskLevel::Safe);
        assert!(!command.confirmation_required);

        let approval = CountingApproval::default();
        let result = SafetyExecutor::new(registry, &PipelineConfig::default())
            .execute(&command, &approval)
            .await;
        assert!(result.success, "{}", result.output);
        assert_eq!(approval.asked(), 0);
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_words_route_to_manage_service() {
        let (registry, _runner) = shipped_registry().await;

        let command = route(&registry, "start nginx service").await.unwrap();
        assert_eq!(command.intent, MANAGE_SERVICE);
        assert_eq!(args(&command)["service"], "nginx");
        assert_eq!(args(&command)["action"], "start");
        assert!(command.confirmation_required);

        let command = route(&registry, "restart the postgresql service").await.unwrap();
        assert_eq!(command.intent, MANAGE_SERVICE);
        assert_eq!(args(&command)["service"], "postgresql");
        assert_eq!(args(&command)["action"], "restart");
    }

    #[tokio::test]
    async fn test_auto_start_phrase_stays_with_its_installer() {
        let (registry, _runner) = shipped_registry().await;

        let command = route(&registry, "set up nginx web server with auto start")
            .await
            .unwrap();
        assert_eq!(command.intent, SETUP_WEB_SERVER);
        assert_eq!(args(&command)["server_type"], "nginx");
        assert_eq!(args(&command)["auto_start"], true);

        let command = route(&registry, "install oracle with no auto start")
            .await
            .unwrap();
        assert_eq!(command.intent, INSTALL_ORACLE_DATABASE);
        assert_eq!(args(&command)["auto_start"], false);
        assert_eq!(command.risk_level, RiskLevel::Destructive);
    }

    #[tokio::test]
    async fn test_install_apache_is_a_package_but_set_up_apache_is_a_web_server() {
        let (registry, _runner) = shipped_registry().await;

        let command = route(&registry, "install apache").await.unwrap();
        assert_eq!(command.intent, INSTALL_PACKAGE);
        assert_eq!(args(&command)["package"], "apache");

        let command = route(&registry, "set up apache").await.unwrap();
        assert_eq!(command.intent, SETUP_WEB_SERVER);
        assert_eq!(args(&command)["server_type"], "apache");
        assert_eq!(args(&command)["ssl_enabled"], true);
    }

    #[tokio::test]
    async fn test_remove_package_at_the_destructive_threshold() {
        let (registry, _runner) = shipped_registry().await;

        // one keyword plus every required value lands exactly on the bar
        let command = route(&registry, "remove htop").await.unwrap();
        assert_eq!(command.intent, REMOVE_PACKAGE);
        assert_eq!(args(&command)["package"], "htop");
        assert_eq!(args(&command)["purge"], false);
        assert_eq!(command.risk_level, RiskLevel::Destructive);
        assert_eq!(command.confidence, 0.75);
        assert!(command.confirmation_required);

        let stricter = Router::new(
            Arc::new(RuleBasedResolver::new()),
            &PipelineConfig::default().with_destructive_min_confidence(0.8),
        );
        let err = stricter
            .route("remove htop", &registry.snapshot())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedIntent { .. }));

        // no package named: below the bar, refused rather than guessed
        let err = route(&registry, "remove").await.unwrap_err();
        assert!(err.to_string().contains("destructive"), "{err}");
    }
}
