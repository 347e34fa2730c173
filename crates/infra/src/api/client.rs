//! JSON API client over the request dispatcher
//!
//! Wires the cookie jar, identity-provider refresher and refresh coordinator
//! from a [`ClientConfig`] and exposes typed `get` / `post` / `delete`
//! helpers.

use std::sync::Arc;

use dealroom_core::{
    CookieDomains, DependentStateInvalidator, NoopInvalidator, RefreshStats, RetryPolicy,
    SessionRefreshCoordinator,
};
use dealroom_domain::ClientConfig;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::dispatcher::{OutboundRequest, RequestDispatcher};
use super::errors::ApiError;
use crate::http::HttpClient;
use crate::session::{ConfiguredDomainResolver, CookieCredentialStore, HttpSessionRefresher};

const USER_AGENT: &str = concat!("dealroom-session/", env!("CARGO_PKG_VERSION"));

/// Portal API client with transparent session refresh
pub struct ApiClient {
    base_url: Url,
    dispatcher: RequestDispatcher,
    cookies: Arc<CookieCredentialStore>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cookie jar holding the session markers, e.g. to seed it after login
    pub fn cookies(&self) -> &Arc<CookieCredentialStore> {
        &self.cookies
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn session_stats(&self) -> RefreshStats {
        self.dispatcher.coordinator().stats()
    }

    /// Resolve an API path against the base URL
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the path does not form a valid URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Config(format!("Invalid API path '{}': {}", path, e)))
    }

    /// Execute a GET request
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = OutboundRequest::get(self.url(path)?);
        let result = self.send_json(request).await?;
        debug!(path = %path, "GET request successful");
        Ok(result)
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let request = OutboundRequest::post(self.url(path)?).json(body)?;
        let result = self.send_json(request).await?;
        debug!(path = %path, "POST request successful");
        Ok(result)
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = OutboundRequest::delete(self.url(path)?);
        let result = self.send_json(request).await?;
        debug!(path = %path, "DELETE request successful");
        Ok(result)
    }

    /// Dispatch a prepared request without decoding the response
    ///
    /// # Errors
    /// See [`RequestDispatcher::dispatch`].
    pub async fn send(&self, request: OutboundRequest) -> Result<Response, ApiError> {
        self.dispatcher.dispatch(request).await
    }

    /// End the session: clears the markers, signs out and resets dependent
    /// stores. Waits for any refresh in flight.
    pub async fn logout(&self) {
        self.dispatcher.coordinator().end_session().await;
        info!("logged out");
    }

    async fn send_json<R: DeserializeOwned>(&self, request: OutboundRequest) -> Result<R, ApiError> {
        let request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
        let response = self.dispatcher.dispatch(request).await?;
        decode_json(response).await
    }
}

async fn decode_json<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
    let status = response.status();

    // 204/205 carry no body
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
            ApiError::Client(format!(
                "No content response ({}), but response type cannot be deserialized from empty body",
                status.as_u16()
            ))
        });
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Client(format!("Failed to parse response: {}", e)))
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    cookies: Option<Arc<CookieCredentialStore>>,
    invalidator: Option<Arc<dyn DependentStateInvalidator>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an existing cookie jar instead of an empty one
    pub fn cookies(mut self, cookies: Arc<CookieCredentialStore>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Stores to reset on terminal session failure
    pub fn invalidator(mut self, invalidator: Arc<dyn DependentStateInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the configuration is invalid or the HTTP
    /// client cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let base_url = with_trailing_slash(config.api_base_url()?);

        let http = HttpClient::builder()
            .timeout(config.api.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        let cookies =
            self.cookies.unwrap_or_else(|| Arc::new(CookieCredentialStore::from_config(&config.session)));
        let refresher = HttpSessionRefresher::from_config(&config, http.clone(), cookies.clone())?;
        let domains = CookieDomains::new(Arc::new(ConfiguredDomainResolver::from_config(&config)?))
            .with_production(config.session.production_domain.clone())
            .with_local_dev(config.session.local_dev_domain.clone());

        let coordinator = SessionRefreshCoordinator::builder()
            .refresher(Arc::new(refresher))
            .credentials(cookies.clone())
            .domains(domains)
            .invalidator(self.invalidator.unwrap_or_else(|| Arc::new(NoopInvalidator)))
            .policy(RetryPolicy::from_config(&config.retry))
            .build()?;

        let dispatcher = RequestDispatcher::new(http, cookies.clone(), Arc::new(coordinator));

        Ok(ApiClient { base_url, dispatcher, cookies })
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
