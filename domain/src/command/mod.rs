//! Command domain module
//!
//! - [`Command`] - what the router produces for one utterance
//! - [`RiskClassifier`] - derives risk and the confirmation gate from the
//!   descriptors a command references

pub mod entities;
pub mod risk;

pub use entities::{Command, MissingParameter};
pub use risk::{RiskAssessment, RiskClassifier};
