//! Execution phase state machine.
//!
//! Tracks the lifecycle of one command inside the safety executor.
//!
//! # State Transitions
//!
//! ```text
//! Planned ──> DryRun ──┬──> ConfirmPending ──┬──> Executing ──> Succeeded
//!    │          │      │                     │         └──────> Failed
//!    │          │      └──> Executing        └──> Cancelled
//!    └──────────┴──> Failed   (stale reference, invalid params, dry-run rejection)
//! ```
//!
//! `Executing` may also end in `Cancelled` when a session-level cancellation
//! arrives between tool invocations. Side effects are only permitted while
//! in `Executing`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Planned,
    DryRun,
    ConfirmPending,
    Executing,
    Succeeded,
    Failed,
    Cancelled,
}

/// Attempted transition that the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid phase transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ExecutionPhase,
    pub to: ExecutionPhase,
}

impl ExecutionPhase {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionPhase::Planned => "planned",
            ExecutionPhase::DryRun => "dry_run",
            ExecutionPhase::ConfirmPending => "confirm_pending",
            ExecutionPhase::Executing => "executing",
            ExecutionPhase::Succeeded => "succeeded",
            ExecutionPhase::Failed => "failed",
            ExecutionPhase::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionPhase::Succeeded | ExecutionPhase::Failed | ExecutionPhase::Cancelled
        )
    }

    /// Whether tools may mutate system state in this phase
    pub fn allows_side_effects(&self) -> bool {
        matches!(self, ExecutionPhase::Executing)
    }

    pub fn can_transition_to(&self, next: ExecutionPhase) -> bool {
        use ExecutionPhase::*;
        matches!(
            (self, next),
            (Planned, DryRun)
                | (Planned, Failed)
                | (DryRun, ConfirmPending)
                | (DryRun, Executing)
                | (DryRun, Failed)
                | (ConfirmPending, Executing)
                | (ConfirmPending, Cancelled)
                | (Executing, Succeeded)
                | (Executing, Failed)
                | (Executing, Cancelled)
        )
    }
}

impl std::fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase tracker that rejects invalid transitions and records history
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: ExecutionPhase,
    history: Vec<ExecutionPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: ExecutionPhase::Planned,
            history: vec![ExecutionPhase::Planned],
        }
    }

    pub fn current(&self) -> ExecutionPhase {
        self.current
    }

    pub fn history(&self) -> &[ExecutionPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: ExecutionPhase) -> Result<ExecutionPhase, InvalidTransition> {
        if !self.current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
        self.history.push(next);
        Ok(next)
    }

    pub fn visited(&self, phase: ExecutionPhase) -> bool {
        self.history.contains(&phase)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
