//! Backend configuration from TOML (`[installation]` and `[[backends]]`)

use serde::{Deserialize, Serialize};

/// The built-in installation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInstallationConfig {
    pub enabled: bool,
    /// Prefix privileged commands with `sudo`
    pub sudo: bool,
}

impl Default for FileInstallationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sudo: true,
        }
    }
}

/// An out-of-process tool server
///
/// ```toml
/// [[backends]]
/// name = "k8s"
/// command = "steward-k8s-server"
/// args = ["--context", "prod"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBackendConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}
