//! Application-level configuration.
//!
//! - [`PipelineConfig`]: routing thresholds, resolver choice and tool timeouts

pub mod pipeline;

pub use pipeline::{PipelineConfig, ResolverStrategy};
