//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod audit_log;
pub mod confirmation;
pub mod execution_progress;
pub mod intent;
pub mod telemetry;
