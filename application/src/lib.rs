//! Application layer for steward
//!
//! This crate contains use cases, port definitions, the tool registry and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod routing;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{PipelineConfig, ResolverStrategy};
pub use ports::{
    audit_log::{AuditEntry, AuditLogger, NoAuditLogger},
    confirmation::{
        AutoApprove, AutoDecline, ConfirmationError, ConfirmationPort, ConfirmationRequest,
    },
    execution_progress::{ExecutionProgress, NoProgress},
    intent::{ClassifierError, IntentClassifier, IntentResolver, ModelIntent, ModelStep},
    telemetry::{NoTelemetry, TelemetrySink},
};
pub use registry::{RegistryError, RegistryStats, ToolRegistry};
pub use routing::{HybridResolver, ModelResolver, RuleBasedResolver};
pub use use_cases::error::PipelineError;
pub use use_cases::execute_command::SafetyExecutor;
pub use use_cases::route_command::Router;
pub use use_cases::session::AssistantSession;
