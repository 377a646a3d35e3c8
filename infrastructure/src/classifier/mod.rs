//! Intent classifier adapters
//!
//! | Adapter | Transport | Feature |
//! |---------|-----------|---------|
//! | [`HttpIntentClassifier`] | JSON over HTTP POST | `http-classifier` |

#[cfg(feature = "http-classifier")]
pub mod http;

#[cfg(feature = "http-classifier")]
pub use http::HttpIntentClassifier;
