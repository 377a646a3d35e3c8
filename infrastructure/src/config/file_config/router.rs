//! Routing configuration from TOML (`[router]` and `[router.model]`)

use serde::{Deserialize, Serialize};

/// Raw router configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouterConfig {
    /// Resolver strategy: `rules`, `model` or `hybrid`
    pub resolver: String,
    pub min_confidence: f32,
    pub destructive_min_confidence: f32,
    /// Hybrid only: rule confidence at which the classifier is skipped
    pub hybrid_rule_threshold: f32,
    pub model: FileModelConfig,
}

impl Default for FileRouterConfig {
    fn default() -> Self {
        Self {
            resolver: "rules".to_string(),
            min_confidence: 0.5,
            destructive_min_confidence: 0.75,
            hybrid_rule_threshold: 0.8,
            model: FileModelConfig::default(),
        }
    }
}

/// Intent classifier endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 20,
        }
    }
}
