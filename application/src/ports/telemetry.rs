//! Telemetry port
//!
//! Fire-and-forget counters and timings for the routing and execution
//! pipeline. Every method has an empty default so adapters only implement
//! what they export.

use std::time::Duration;

use steward_domain::{ErrorKind, RiskLevel};

pub trait TelemetrySink: Send + Sync {
    /// A command was routed (or rejected, with `intent = None`)
    fn command_routed(&self, _intent: Option<&str>, _confidence: f32) {}

    /// One tool invocation finished, in either mode
    fn tool_latency(&self, _tool: &str, _dry_run: bool, _elapsed: Duration, _success: bool) {}

    /// The operator answered a confirmation prompt
    fn confirmation(&self, _risk: RiskLevel, _accepted: bool) {}

    /// A command reached a terminal phase
    fn command_finished(&self, _intent: &str, _success: bool, _error: Option<ErrorKind>) {}
}

/// Telemetry that drops everything
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {}
