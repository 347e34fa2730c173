#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dealroom_core::{CookieScope, DependentStateInvalidator};
use dealroom_domain::ClientConfig;
use dealroom_infra::ApiClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Respond};

pub const MARKER: &str = "sb-abcd-auth-token";
pub const REFRESH_PATH: &str = "/auth/v1/token";
pub const SIGN_OUT_PATH: &str = "/auth/v1/logout";

/// Counts resets and claim reloads of the dependent stores.
#[derive(Default)]
pub struct CountingInvalidator {
    notifications: AtomicUsize,
    reloads: AtomicUsize,
}

impl CountingInvalidator {
    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependentStateInvalidator for CountingInvalidator {
    async fn notify_permanent_failure(&self) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }

    async fn reload_claims(&self) -> dealroom_domain::Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock portal + identity provider with a client wired against it.
pub struct Portal {
    pub server: MockServer,
    pub client: ApiClient,
    pub invalidator: Arc<CountingInvalidator>,
}

impl Portal {
    /// Portal with a 100ms backoff base and a sign-out endpoint.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Portal whose default configuration is adjusted by `configure`.
    pub async fn start_with(configure: impl FnOnce(&mut ClientConfig)) -> Self {
        let server = MockServer::start().await;

        let mut config = ClientConfig::default();
        config.api.base_url = server.uri();
        config.session.sign_out_path = Some(SIGN_OUT_PATH.to_string());
        config.retry.base_delay_ms = 100;
        configure(&mut config);

        let invalidator = Arc::new(CountingInvalidator::default());
        let client = ApiClient::builder()
            .config(config)
            .invalidator(invalidator.clone())
            .build()
            .expect("api client");

        Self { server, client, invalidator }
    }

    /// Host-only scope of the mock server
    pub fn host_scope(&self) -> CookieScope {
        CookieScope::host(&self.server.address().ip().to_string())
    }

    pub fn seed_session(&self, value: &str) {
        self.client.cookies().insert(self.host_scope(), MARKER, value);
    }

    pub fn session_value(&self) -> Option<String> {
        self.client.cookies().get(&self.host_scope(), MARKER)
    }

    /// Mount the identity provider's refresh endpoint.
    pub async fn mock_refresh(&self, responder: impl Respond + 'static, expected: u64) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(responder)
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Mount the identity provider's sign-out endpoint.
    pub async fn mock_sign_out(&self, responder: impl Respond + 'static, expected: u64) {
        Mock::given(method("POST"))
            .and(path(SIGN_OUT_PATH))
            .respond_with(responder)
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Mount a sign-out endpoint that only answers when `cookie` is sent.
    pub async fn mock_sign_out_with_cookie(&self, cookie: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path(SIGN_OUT_PATH))
            .and(header("cookie", cookie))
            .respond_with(wiremock::ResponseTemplate::new(204))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub fn cookie(value: &str) -> String {
        format!("{MARKER}={value}")
    }
}
