//! Configuration file loading for steward
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `STEWARD_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./steward.toml` or `./.steward.toml`
//! 4. Global: `~/.config/steward/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileAuditConfig, FileBackendConfig, FileConfig, FileExecutorConfig,
    FileInstallationConfig, FileLoggingConfig, FileModelConfig, FileOutputConfig, FileReplConfig,
    FileRouterConfig, OUTPUT_FORMATS, Severity, expand_home,
};
pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
