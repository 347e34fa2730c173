//! HTTP refresher against the identity provider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealroom_core::{CredentialStore, RefreshError, SessionRefresher};
use dealroom_domain::{ClientConfig, DealroomError, Result};
use reqwest::{Method, Response};
use tracing::{debug, instrument};
use url::Url;

use super::cookie_store::CookieCredentialStore;
use crate::http::HttpClient;

/// Longest error body kept in a [`RefreshError::Status`] message.
const MAX_ERROR_BODY: usize = 256;

/// Exchanges the session held in the cookie jar for a new one.
///
/// The current cookies are sent with the refresh call and the identity
/// provider's `Set-Cookie` answer is written back into the jar. Every call is
/// bounded by its own timeout and surfaces as [`RefreshError::Timeout`].
pub struct HttpSessionRefresher {
    http: HttpClient,
    jar: Arc<CookieCredentialStore>,
    refresh_url: Url,
    sign_out_url: Option<Url>,
    timeout: Duration,
}

impl HttpSessionRefresher {
    pub fn new(http: HttpClient, jar: Arc<CookieCredentialStore>, refresh_url: Url) -> Self {
        Self {
            http,
            jar,
            refresh_url,
            sign_out_url: None,
            timeout: Duration::from_millis(dealroom_domain::constants::DEFAULT_REFRESH_TIMEOUT_MS),
        }
    }

    pub fn with_sign_out_url(mut self, url: Url) -> Self {
        self.sign_out_url = Some(url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    /// Returns `DealroomError::Config` if the base URL or an endpoint path
    /// cannot be joined into a valid URL.
    pub fn from_config(
        config: &ClientConfig,
        http: HttpClient,
        jar: Arc<CookieCredentialStore>,
    ) -> Result<Self> {
        let base = config.api_base_url()?;
        let mut refresher = Self::new(http, jar, join(&base, &config.session.refresh_path)?)
            .with_timeout(config.session.refresh_timeout());

        if let Some(path) = &config.session.sign_out_path {
            refresher = refresher.with_sign_out_url(join(&base, path)?);
        }
        Ok(refresher)
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    async fn post_with_cookies(&self, url: &Url) -> std::result::Result<Response, RefreshError> {
        let mut builder = self.http.request(Method::POST, url.clone());
        if let Some(credentials) =
            url.host_str().and_then(|host| self.jar.credential_header(host))
        {
            builder = builder.header(credentials.name, credentials.value);
        }
        let request = builder.build().map_err(|err| RefreshError::Transport(err.to_string()))?;

        match tokio::time::timeout(self.timeout, self.http.execute(request)).await {
            Err(_) => Err(RefreshError::Timeout(self.timeout)),
            Ok(Err(err)) if err.is_timeout() => Err(RefreshError::Timeout(self.timeout)),
            Ok(Err(err)) => Err(RefreshError::Transport(err.to_string())),
            Ok(Ok(response)) => Ok(response),
        }
    }
}

#[async_trait]
impl SessionRefresher for HttpSessionRefresher {
    #[instrument(skip(self))]
    async fn refresh_session(&self) -> std::result::Result<(), RefreshError> {
        let response = self.post_with_cookies(&self.refresh_url).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Status {
                status: status.as_u16(),
                message: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        if let Some(origin) = self.refresh_url.host_str() {
            self.jar.absorb_response(origin, response.headers());
        }
        debug!(%status, "identity provider issued a new session");
        Ok(())
    }

    async fn sign_out(&self) -> std::result::Result<(), RefreshError> {
        let Some(url) = &self.sign_out_url else {
            return Ok(());
        };

        let response = self.post_with_cookies(url).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RefreshError::Status { status: status.as_u16(), message: "sign-out rejected".into() })
        }
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| DealroomError::Config(format!("Invalid endpoint path '{path}': {e}")))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
