//! `tracing`-backed telemetry with in-process tallies.
//!
//! Every event is emitted on target `steward::telemetry`, so it can be
//! routed or filtered separately (`RUST_LOG=steward::telemetry=info`).
//! [`TracingTelemetry::snapshot`] returns the running totals for `/stats`
//! style summaries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use steward_application::TelemetrySink;
use steward_domain::{ErrorKind, RiskLevel};
use tracing::info;

/// Running totals since the sink was created
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub routed: u64,
    pub unresolved: u64,
    pub confirmations_accepted: u64,
    pub confirmations_declined: u64,
    pub commands_succeeded: u64,
    pub commands_failed: u64,
    /// Failures by error kind
    pub errors: HashMap<String, u64>,
    /// Execute-mode invocations per tool as (count, total milliseconds)
    pub tool_time: HashMap<String, (u64, u64)>,
}

impl TelemetrySnapshot {
    /// Mean execute-mode latency of a tool in milliseconds
    pub fn mean_latency_ms(&self, tool: &str) -> Option<u64> {
        self.tool_time
            .get(tool)
            .filter(|(count, _)| *count > 0)
            .map(|(count, total)| total / count)
    }
}

#[derive(Default)]
pub struct TracingTelemetry {
    tally: Mutex<TelemetrySnapshot>,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.tally
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut TelemetrySnapshot)) {
        if let Ok(mut tally) = self.tally.lock() {
            f(&mut tally);
        }
    }
}

impl TelemetrySink for TracingTelemetry {
    fn command_routed(&self, intent: Option<&str>, confidence: f32) {
        info!(
            target: "steward::telemetry",
            event = "command_routed",
            intent = intent.unwrap_or("-"),
            confidence
        );
        self.update(|t| match intent {
            Some(_) => t.routed += 1,
            None => t.unresolved += 1,
        });
    }

    fn tool_latency(&self, tool: &str, dry_run: bool, elapsed: Duration, success: bool) {
        let ms = elapsed.as_millis() as u64;
        info!(
            target: "steward::telemetry",
            event = "tool_latency",
            tool,
            dry_run,
            ms,
            success
        );
        if !dry_run {
            self.update(|t| {
                let entry = t.tool_time.entry(tool.to_string()).or_default();
                entry.0 += 1;
                entry.1 += ms;
            });
        }
    }

    fn confirmation(&self, risk: RiskLevel, accepted: bool) {
        info!(
            target: "steward::telemetry",
            event = "confirmation",
            risk = %risk,
            accepted
        );
        self.update(|t| {
            if accepted {
                t.confirmations_accepted += 1;
            } else {
                t.confirmations_declined += 1;
            }
        });
    }

    fn command_finished(&self, intent: &str, success: bool, error: Option<ErrorKind>) {
        info!(
            target: "steward::telemetry",
            event = "command_finished",
            intent,
            success,
            error = error.map(|e| e.as_str().to_string()).unwrap_or_default()
        );
        self.update(|t| {
            if success {
                t.commands_succeeded += 1;
            } else {
                t.commands_failed += 1;
            }
            if let Some(kind) = error {
                *t.errors.entry(kind.as_str().to_string()).or_default() += 1;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tallies() {
        let telemetry = TracingTelemetry::new();
        telemetry.command_routed(Some("install_package"), 0.75);
        telemetry.command_routed(None, 0.1);
        telemetry.confirmation(RiskLevel::Moderate, false);
        telemetry.command_finished(
            "install_package",
            false,
            Some(ErrorKind::ConfirmationDeclined),
        );

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.routed, 1);
        assert_eq!(snapshot.unresolved, 1);
        assert_eq!(snapshot.confirmations_declined, 1);
        assert_eq!(snapshot.commands_failed, 1);
        assert_eq!(snapshot.errors.get(ErrorKind::ConfirmationDeclined.as_str()), Some(&1));
    }

    #[test]
    fn test_dry_runs_do_not_count_toward_latency() {
        let telemetry = TracingTelemetry::new();
        telemetry.tool_latency("install_package", true, Duration::from_millis(5), true);
        telemetry.tool_latency("install_package", false, Duration::from_millis(100), true);
        telemetry.tool_latency("install_package", false, Duration::from_millis(300), false);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.tool_time["install_package"], (2, 400));
        assert_eq!(snapshot.mean_latency_ms("install_package"), Some(200));
        assert_eq!(snapshot.mean_latency_ms("manage_service"), None);
    }
}
