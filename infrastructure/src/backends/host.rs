//! Host access for in-process backends.
//!
//! Everything the installation backend needs from the machine goes through
//! one of three seams, so the backend itself stays testable:
//!
//! - [`CommandRunner`] runs a program (real: [`ProcessRunner`])
//! - [`CommandLocator`] answers "is this program on PATH" (real: [`WhichLocator`])
//! - [`SystemProbe`] reports memory, CPU and disk facts (real: [`SysinfoProbe`])

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use steward_domain::truncate;
use sysinfo::{Disks, System};
use tokio::process::Command;
use tracing::debug;

/// Maximum captured output per stream (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A program and its arguments, never passed through a shell implicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Prefix with `sudo` when `elevate` is set
    pub fn elevated(self, elevate: bool) -> Self {
        if !elevate {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".into(),
            args,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of one program run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout and stderr combined the way an operator would read them
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !out.is_empty() {
                out.push_str("\n--- stderr ---\n");
            }
            out.push_str(stderr);
        }
        out
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;
}

/// Runs programs with `tokio::process`.
///
/// Children are killed when the future is dropped, so an executor timeout
/// does not leave the process running.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        debug!(command = %spec, "Running host command");
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: truncate(&String::from_utf8_lossy(&output.stdout), MAX_OUTPUT_SIZE),
            stderr: truncate(&String::from_utf8_lossy(&output.stderr), MAX_OUTPUT_SIZE),
        })
    }
}

pub trait CommandLocator: Send + Sync {
    fn exists(&self, program: &str) -> bool;
}

/// PATH lookup through the `which` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct WhichLocator;

impl CommandLocator for WhichLocator {
    fn exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Point-in-time facts about the host
#[derive(Debug, Clone, PartialEq)]
pub struct SystemFacts {
    pub os: String,
    pub arch: String,
    pub hostname: String,
    pub cpus: usize,
    pub total_memory_gb: f64,
    pub available_memory_gb: f64,
    /// Filesystems as (mount point, total GB, available GB)
    pub disks: Vec<(String, f64, f64)>,
    pub uptime_hours: u64,
}

impl SystemFacts {
    /// Available space on the filesystem holding `path`.
    ///
    /// Picks the longest mount point that prefixes `path`.
    pub fn available_gb_for(&self, path: &str) -> Option<f64> {
        self.disks
            .iter()
            .filter(|(mount, _, _)| Path::new(path).starts_with(mount))
            .max_by_key(|(mount, _, _)| mount.len())
            .map(|(_, _, available)| *available)
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    pub fn is_64_bit(&self) -> bool {
        matches!(self.arch.as_str(), "x86_64" | "aarch64")
    }
}

pub trait SystemProbe: Send + Sync {
    fn facts(&self) -> SystemFacts;
}

/// System facts from `sysinfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProbe;

impl SystemProbe for SysinfoProbe {
    fn facts(&self) -> SystemFacts {
        let mut sys = System::new_all();
        sys.refresh_all();

        let disks = Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| {
                (
                    disk.mount_point().to_string_lossy().to_string(),
                    disk.total_space() as f64 / BYTES_PER_GB,
                    disk.available_space() as f64 / BYTES_PER_GB,
                )
            })
            .collect();

        SystemFacts {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            cpus: sys.cpus().len(),
            total_memory_gb: sys.total_memory() as f64 / BYTES_PER_GB,
            available_memory_gb: sys.available_memory() as f64 / BYTES_PER_GB,
            disks,
            uptime_hours: System::uptime() / 3600,
        }
    }
}
