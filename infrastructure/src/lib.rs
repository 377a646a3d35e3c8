//! Infrastructure layer for steward
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: backend tool servers, the intent classifier
//! client, the audit trail, telemetry and configuration file loading.

pub mod backends;
pub mod classifier;
pub mod config;
pub mod logging;
pub mod telemetry;

// Re-export commonly used types
pub use backends::{InstallationBackend, ProcessBackend};
#[cfg(feature = "http-classifier")]
pub use classifier::HttpIntentClassifier;
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlAuditLogger;
pub use telemetry::{TelemetrySnapshot, TracingTelemetry};
