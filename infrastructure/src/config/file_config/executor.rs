//! Executor configuration from TOML (`[executor]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutorConfig {
    /// Budget for each tool invocation, dry run or execute
    pub tool_timeout_secs: u64,
}

impl Default for FileExecutorConfig {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 300,
        }
    }
}
