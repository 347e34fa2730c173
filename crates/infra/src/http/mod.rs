//! HTTP transport shared by the refresher and the request dispatcher.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
