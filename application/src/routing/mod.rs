//! Intent resolution strategies
//!
//! ```text
//! utterance ─▶ normalize ─▶ split_clauses ─▶ tokenize ─┬▶ keyword score ─▶ extract params
//!                                                       └▶ IntentClassifier (model / hybrid)
//! ```
//!
//! - [`RuleBasedResolver`] - deterministic keyword rules, offline
//! - [`ModelResolver`] - an [`IntentClassifier`](crate::ports::intent::IntentClassifier)
//!   held to the catalog
//! - [`HybridResolver`] - rules first, classifier when the rules are unsure

pub mod describe;
pub mod extract;
pub mod hybrid;
pub mod model;
pub mod normalize;
pub mod rule_based;

pub use describe::describe_command;
pub use hybrid::HybridResolver;
pub use model::ModelResolver;
pub use normalize::normalize;
pub use rule_based::RuleBasedResolver;
