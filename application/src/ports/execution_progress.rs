//! Progress notification port
//!
//! Defines the interface for reporting progress while the safety executor
//! walks a command through its phases.

use steward_domain::{ExecutionPhase, ToolName, ToolRunOutcome};

/// Callback for progress updates during command execution
///
/// Implementations live in the presentation layer (spinners, plain log
/// lines). All methods default to no-ops.
pub trait ExecutionProgress: Send + Sync {
    /// Called on every phase transition
    fn on_phase(&self, _phase: ExecutionPhase) {}

    /// Called before a tool is invoked in execute mode
    fn on_tool_start(&self, _tool: &ToolName, _index: usize, _total: usize) {}

    /// Called after a tool finished in execute mode
    fn on_tool_complete(&self, _tool: &ToolName, _outcome: &ToolRunOutcome) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ExecutionProgress for NoProgress {}
