//! Domain layer for steward
//!
//! This crate contains the core types of the routing and safety pipeline.
//! It has no dependencies on infrastructure or presentation concerns and
//! performs no I/O.
//!
//! # Core Concepts
//!
//! - **Tool**: a backend operation described by a [`ToolDescriptor`] with a
//!   parameter schema and a risk hint
//! - **Command**: the typed result of routing one utterance
//! - **Risk**: `safe < moderate < destructive`; anything above safe needs
//!   human confirmation
//! - **Execution**: dry-run plan, phase state machine and normalized result

pub mod command;
pub mod core;
pub mod execution;
pub mod tool;

// Re-export commonly used types
pub use command::{Command, MissingParameter, RiskAssessment, RiskClassifier};
pub use core::string::truncate;
pub use execution::{
    ErrorInfo, ErrorKind, ExecutionPhase, ExecutionPlan, ExecutionResult, PhaseTracker, PlanStep,
    SkipReason, StepVerification, ToolRunOutcome, ToolRunRecord,
};
pub use tool::{
    BackendError, ContentItem, DefaultToolValidator, ExtractionHint, ParamKind, RiskLevel,
    SchemaViolation, ToolArguments, ToolBackend, ToolCatalog, ToolDescriptor, ToolId, ToolMode,
    ToolName, ToolParameter, ToolRequest, ToolResponse, ToolValidator,
};
