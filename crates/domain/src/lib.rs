//! # Dealroom Domain
//!
//! Shared types for the Dealroom portal session client.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Session and retry constants
//!
//! ## Architecture
//! - No dependencies on other Dealroom crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
