//! Tool Registry
//!
//! The [`ToolRegistry`] owns the live catalog of tool descriptors and routes
//! invocations to the backend that serves each tool.
//!
//! # Usage
//!
//! ```ignore
//! let registry = ToolRegistry::new();
//! registry.register_backend(Arc::new(InstallationBackend::new())).await?;
//!
//! let catalog = registry.snapshot();
//! assert!(catalog.contains("install_package"));
//!
//! let response = registry
//!     .invoke("install_package", args, ToolMode::DryRun)
//!     .await?;
//! ```
//!
//! # Consistency
//!
//! - Descriptors are written once at registration and only removed by
//!   [`deregister`](ToolRegistry::deregister).
//! - Every tool has a lease. [`invoke`](ToolRegistry::invoke) holds a shared
//!   lease for the whole backend call; `deregister` takes the exclusive lease
//!   first, so a tool is never removed while one of its invocations is in
//!   flight.
//! - Invocations that were waiting behind a deregistration re-check the
//!   catalog after acquiring their lease and fail with
//!   [`RegistryError::UnknownTool`].
//! - Arguments are validated against the descriptor schema before any
//!   backend sees them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use steward_domain::{
    BackendError, DefaultToolValidator, SchemaViolation, ToolArguments, ToolBackend, ToolCatalog,
    ToolDescriptor, ToolId, ToolMode, ToolName, ToolRequest, ToolResponse, ToolValidator,
};
use thiserror::Error;
use tokio::sync::RwLock as LeaseLock;

/// Errors that can occur during registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Tool not registered: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(ToolName),

    #[error("Invalid arguments for '{tool}': {}", format_violations(.violations))]
    InvalidParameters {
        tool: ToolName,
        violations: Vec<SchemaViolation>,
    },

    #[error("Backend error for '{tool}': {source}")]
    Backend {
        tool: ToolName,
        #[source]
        source: BackendError,
    },
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

struct Entry {
    backend: Arc<dyn ToolBackend>,
    lease: Arc<LeaseLock<()>>,
}

#[derive(Default)]
struct RegistryState {
    catalog: ToolCatalog,
    entries: HashMap<ToolId, Entry>,
}

/// Registry of live tools
pub struct ToolRegistry {
    state: RwLock<RegistryState>,
    validator: DefaultToolValidator,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            validator: DefaultToolValidator,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register one descriptor served by `backend`
    pub fn register(
        &self,
        descriptor: ToolDescriptor,
        backend: Arc<dyn ToolBackend>,
    ) -> Result<ToolId, RegistryError> {
        let name = descriptor.name.clone();
        let mut state = self.write_state();
        let id = state
            .catalog
            .insert(descriptor)
            .ok_or_else(|| RegistryError::DuplicateTool(name.clone()))?;
        tracing::debug!(tool = %name, backend = backend.id(), "Registered tool");
        state.entries.insert(
            id,
            Entry {
                backend,
                lease: Arc::new(LeaseLock::new(())),
            },
        );
        Ok(id)
    }

    /// Discover and register every tool a backend serves.
    ///
    /// Tools whose names are already registered keep their first backend.
    pub async fn register_backend(
        &self,
        backend: Arc<dyn ToolBackend>,
    ) -> Result<Vec<ToolName>, BackendError> {
        let descriptors = backend.describe().await?;
        let mut registered = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let name = descriptor.name.clone();
            match self.register(descriptor, Arc::clone(&backend)) {
                Ok(_) => registered.push(name),
                Err(e) => {
                    tracing::warn!(
                        tool = %name,
                        backend = backend.id(),
                        error = %e,
                        "Skipping tool already registered by another backend"
                    );
                }
            }
        }

        Ok(registered)
    }

    /// Remove a tool, waiting for in-flight invocations to finish first.
    pub async fn deregister(&self, name: &str) -> Result<ToolDescriptor, RegistryError> {
        let (id, lease) = {
            let state = self.read_state();
            let id = state
                .catalog
                .id_of(name)
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            let lease = state
                .entries
                .get(&id)
                .map(|e| Arc::clone(&e.lease))
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            (id, lease)
        };

        let _exclusive = lease.write().await;

        let mut state = self.write_state();
        if state.catalog.id_of(name) != Some(id) {
            return Err(RegistryError::UnknownTool(name.to_string()));
        }
        state.entries.remove(&id);
        let descriptor = state
            .catalog
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = %name, "Deregistered tool");
        Ok(descriptor)
    }

    /// Descriptor of a registered tool
    pub fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.read_state().catalog.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_state().catalog.contains(name)
    }

    /// Point-in-time copy of the catalog, for routing
    pub fn snapshot(&self) -> ToolCatalog {
        self.read_state().catalog.clone()
    }

    pub fn len(&self) -> usize {
        self.read_state().catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke a tool after schema validation.
    ///
    /// Arguments must already carry defaults; unknown or ill-typed arguments
    /// are rejected before the backend is contacted.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: ToolArguments,
        mode: ToolMode,
    ) -> Result<ToolResponse, RegistryError> {
        let (id, descriptor, backend, lease) = {
            let state = self.read_state();
            let id = state
                .catalog
                .id_of(name)
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            let descriptor = state
                .catalog
                .get_by_id(id)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            let entry = state
                .entries
                .get(&id)
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            (
                id,
                descriptor,
                Arc::clone(&entry.backend),
                Arc::clone(&entry.lease),
            )
        };

        self.validator
            .validate(&arguments, &descriptor)
            .map_err(|violations| RegistryError::InvalidParameters {
                tool: descriptor.name.clone(),
                violations,
            })?;

        let _shared = lease.read_owned().await;
        if self.read_state().catalog.id_of(name) != Some(id) {
            return Err(RegistryError::UnknownTool(name.to_string()));
        }

        tracing::debug!(tool = %name, mode = mode.as_str(), backend = backend.id(), "Invoking tool");
        let request = ToolRequest::new(descriptor.name.clone(), arguments, mode);
        backend
            .invoke(&request)
            .await
            .map_err(|source| RegistryError::Backend {
                tool: descriptor.name,
                source,
            })
    }

    /// Get statistics about registered tools
    pub fn stats(&self) -> RegistryStats {
        let state = self.read_state();
        let mut tools_per_backend = HashMap::new();
        for entry in state.entries.values() {
            *tools_per_backend
                .entry(entry.backend.id().to_string())
                .or_insert(0) += 1;
        }

        RegistryStats {
            total_tools: state.catalog.len(),
            tools_per_backend,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_tools: usize,
    pub tools_per_backend: HashMap<String, usize>,
}
