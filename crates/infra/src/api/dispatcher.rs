//! Request dispatcher
//!
//! Every outbound call goes through [`RequestDispatcher::dispatch`]. The
//! dispatcher attaches the current session, and on an authentication-expired
//! response (401) hands over to the [`SessionRefreshCoordinator`] and replays
//! the request exactly once.
//!
//! ```text
//! send ──401──► has_session? ──no──► original 401
//!                    │yes
//!                    ▼
//!          ensure_fresh_session ──err──► terminal error
//!                    │ok
//!                    ▼
//!            replay once ──► response / error
//! ```

use std::sync::Arc;

use dealroom_core::{CredentialStore, SessionRefreshCoordinator};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::errors::ApiError;
use crate::http::HttpClient;

/// A captured outbound call that can be sent again unchanged.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    retried: bool,
}

impl OutboundRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None, retried: false }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    /// Returns `ApiError::Client` if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))?;
        Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")).body(bytes))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Flag the request as already replayed after a session refresh.
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Sends requests with session credentials and recovers from expiry once.
pub struct RequestDispatcher {
    http: HttpClient,
    credentials: Arc<dyn CredentialStore>,
    coordinator: Arc<SessionRefreshCoordinator>,
}

impl RequestDispatcher {
    pub fn new(
        http: HttpClient,
        credentials: Arc<dyn CredentialStore>,
        coordinator: Arc<SessionRefreshCoordinator>,
    ) -> Self {
        Self { http, credentials, coordinator }
    }

    pub fn coordinator(&self) -> &Arc<SessionRefreshCoordinator> {
        &self.coordinator
    }

    /// Send a request, refreshing the session and replaying once on 401.
    ///
    /// # Errors
    /// - the original [`ApiError::Auth`] when no session is present or the
    ///   request was already replayed,
    /// - [`ApiError::Session`] when the session could not be refreshed,
    /// - any other status or transport error unchanged.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.url.path()))]
    pub async fn dispatch(&self, mut request: OutboundRequest) -> Result<Response, ApiError> {
        let response = self.send_once(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED || request.is_retried() {
            return check_status(response, &request.url).await;
        }

        request.mark_retried();
        let expired = check_status(response, &request.url).await;

        if !self.credentials.has_session() {
            debug!("authentication expired without a local session, not refreshing");
            return expired;
        }

        info!("authentication expired, waiting for a fresh session");
        self.coordinator.ensure_fresh_session().await?;

        debug!("replaying request with refreshed session");
        let replay = self.send_once(&request).await?;
        check_status(replay, &request.url).await
    }

    async fn send_once(&self, request: &OutboundRequest) -> Result<Response, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(credentials) =
            request.url.host_str().and_then(|host| self.credentials.credential_header(host))
        {
            builder = builder.header(credentials.name, credentials.value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        self.http.send(builder).await.map_err(ApiError::from)
    }
}

async fn check_status(response: Response, url: &Url) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_status_error(status, url, body))
}

/// Map a non-success status to an [`ApiError`].
pub fn map_status_error(status: StatusCode, url: &Url, body: String) -> ApiError {
    let target = format!("{}{}", url.origin().ascii_serialization(), url.path());
    let message = if body.is_empty() {
        format!("{} returned status {}", target, status)
    } else {
        format!("{} returned status {}: {}", target, status, body)
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Auth(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::RateLimit(message)
    } else if status.is_server_error() {
        ApiError::Server(message)
    } else if status.is_client_error() {
        ApiError::Client(message)
    } else {
        ApiError::Network(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://api.dealroom.app/v1/deals?page=2").unwrap()
    }

    #[test]
    fn status_mapping_follows_categories() {
        assert!(matches!(map_status_error(StatusCode::UNAUTHORIZED, &url(), String::new()), ApiError::Auth(_)));
        assert!(matches!(map_status_error(StatusCode::FORBIDDEN, &url(), String::new()), ApiError::Auth(_)));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, &url(), String::new()),
            ApiError::RateLimit(_)
        ));
        assert!(matches!(map_status_error(StatusCode::BAD_GATEWAY, &url(), String::new()), ApiError::Server(_)));
        assert!(matches!(map_status_error(StatusCode::NOT_FOUND, &url(), String::new()), ApiError::Client(_)));
    }

    #[test]
    fn status_message_omits_query_and_includes_body() {
        let err = map_status_error(StatusCode::CONFLICT, &url(), "duplicate".into());
        let message = err.to_string();
        assert!(message.contains("https://api.dealroom.app/v1/deals returned status 409"));
        assert!(message.ends_with("duplicate"));
        assert!(!message.contains("page=2"));
    }

    #[test]
    fn requests_start_unretried() {
        let mut request = OutboundRequest::get(url());
        assert!(!request.is_retried());
        request.mark_retried();
        assert!(request.is_retried());
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = OutboundRequest::post(url()).json(&serde_json::json!({ "name": "Elm St" })).unwrap();
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(request.body.as_deref(), Some(br#"{"name":"Elm St"}"#.as_slice()));
    }
}
