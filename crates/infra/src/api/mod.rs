//! Portal API access
//!
//! - [`RequestDispatcher`]: attaches the session to every outbound call and
//!   recovers from an expired session with one coordinated refresh and a
//!   single replay
//! - [`ApiClient`]: typed JSON helpers wired from `ClientConfig`
//! - [`ApiError`]: status and transport classification

pub mod client;
pub mod dispatcher;
pub mod errors;

pub use client::{ApiClient, ApiClientBuilder};
pub use dispatcher::{map_status_error, OutboundRequest, RequestDispatcher};
pub use errors::{ApiError, ApiErrorCategory};
