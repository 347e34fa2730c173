//! # Dealroom Infrastructure
//!
//! Infrastructure implementations of the session ports defined in
//! `dealroom-core`.
//!
//! This crate contains:
//! - The HTTP transport (reqwest)
//! - The cookie-jar credential store and identity-provider refresher
//! - The request dispatcher and JSON API client
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `dealroom-core`
//! - Depends on `dealroom-domain` and `dealroom-core`
//! - Contains all "impure" code (network I/O, environment, files)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, OutboundRequest, RequestDispatcher};
pub use http::{HttpClient, HttpClientBuilder};
pub use session::{ConfiguredDomainResolver, CookieCredentialStore, HttpSessionRefresher};
