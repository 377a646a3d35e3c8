//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod error;
pub mod execute_command;
pub mod route_command;
pub mod session;
