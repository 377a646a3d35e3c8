//! Tool domain module
//!
//! Defines how backend tools are described, validated and invoked - the
//! vocabulary shared by the router, the risk classifier and the safety
//! executor.
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolDescriptor   │───▶│ ToolRequest  │───▶│ ToolResponse │
//! │ (catalog entry)  │    │ (dry/execute)│    │ (content)    │
//! └──────┬───────────┘    └──────────────┘    └──────────────┘
//!        │
//!        ├─ name:       ToolName (validated identifier)
//!        ├─ parameters: schema + extraction hints
//!        ├─ risk_hint:  safe | moderate | destructive
//!        └─ keywords:   phrases used by rule-based routing
//! ```
//!
//! # Risk-Based Confirmation
//!
//! | Risk | Examples | Confirmation |
//! |------|----------|--------------|
//! | **Safe** | `check_system_requirements` | No |
//! | **Moderate** | `install_package`, `manage_service` | Yes |
//! | **Destructive** | `install_oracle_database`, `remove_package` | Yes |
//!
//! # Key Types
//!
//! - [`ToolName`] - validated identifier used as the registry key
//! - [`ToolDescriptor`] - schema for a single tool
//! - [`ToolCatalog`] - arena of descriptors with stable [`ToolId`]s
//! - [`ToolValidator`] - pure parameter-schema validation
//! - [`ToolBackend`] - pluggable backend tool server
//! - [`ToolRequest`] / [`ToolResponse`] - the invocation protocol

pub mod backend;
pub mod catalog;
pub mod entities;
pub mod traits;
pub mod value_objects;

pub use backend::{BackendError, ToolBackend};
pub use catalog::{ToolCatalog, ToolId};
pub use entities::{
    ExtractionHint, InvalidToolName, ParamKind, RiskLevel, ToolDescriptor, ToolName, ToolParameter,
};
pub use traits::{
    DefaultToolValidator, SchemaViolation, ToolArguments, ToolValidator, apply_defaults,
    missing_required,
};
pub use value_objects::{ContentItem, ToolMode, ToolRequest, ToolResponse};
