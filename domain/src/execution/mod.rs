//! Execution domain module
//!
//! Types produced by the safety executor:
//!
//! - [`ExecutionPlan`] - side-effect-free projection, one step per tool
//! - [`ExecutionResult`] - normalized outcome with per-tool records
//! - [`ExecutionPhase`] / [`PhaseTracker`] - the executor's state machine
//! - [`ErrorInfo`] / [`ErrorKind`] - classified failures

pub mod phase;
pub mod plan;
pub mod result;

pub use phase::{ExecutionPhase, InvalidTransition, PhaseTracker};
pub use plan::{ExecutionPlan, PlanStep, StepVerification};
pub use result::{ErrorInfo, ErrorKind, ExecutionResult, SkipReason, ToolRunOutcome, ToolRunRecord};
