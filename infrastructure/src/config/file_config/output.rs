//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};

pub const OUTPUT_FORMATS: [&str; 2] = ["text", "json"];

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Result format (`text` or `json`); `--output` overrides it
    pub format: Option<String>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}
