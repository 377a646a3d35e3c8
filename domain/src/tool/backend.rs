//! Backend tool server abstraction
//!
//! This module defines the [`ToolBackend`] trait, implemented by every
//! pluggable unit that executes tools on behalf of the safety executor.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ToolRegistry                          │
//! │  (descriptor catalog, schema enforcement, per-tool leases)  │
//! └─────────────────────────────────────────────────────────────┘
//!              │                                   │
//!              ▼                                   ▼
//!    ┌───────────────────┐              ┌───────────────────┐
//!    │ InstallationBackend│              │  ProcessBackend   │
//!    │   (in-process)     │              │ (JSON lines/stdio)│
//!    └───────────────────┘              └───────────────────┘
//! ```
//!
//! Backends only see [`ToolRequest`]s that already passed schema validation.
//! A compliant backend never turns a [`ToolMode::DryRun`] request into a
//! mutating operation.
//!
//! [`ToolMode::DryRun`]: super::value_objects::ToolMode::DryRun

use async_trait::async_trait;
use thiserror::Error;

use super::entities::ToolDescriptor;
use super::value_objects::{ToolRequest, ToolResponse};

/// Error type for backend operations.
///
/// These are transport or availability failures. A tool that ran and
/// reported a failure returns `Ok(ToolResponse { is_error: true, .. })`.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend is not available (e.g., server process failed to start)
    #[error("Backend not available: {0}")]
    NotAvailable(String),

    /// Failed to list tools from the backend
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// The backend does not serve this tool
    #[error("Tool not served by backend: {0}")]
    UnknownTool(String),

    /// Request/response exchange failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with something that is not a valid response
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Pluggable backend tool server
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Unique identifier for this backend
    ///
    /// Examples: "installation", "process:k8s"
    fn id(&self) -> &str;

    /// Descriptors of every tool this backend serves
    async fn describe(&self) -> Result<Vec<ToolDescriptor>, BackendError>;

    /// Handle one invocation
    async fn invoke(&self, request: &ToolRequest) -> Result<ToolResponse, BackendError>;
}
