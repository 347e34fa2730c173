//! In-memory mocks for the session ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dealroom_core::{
    CookieDomainResolver, CookieScope, CredentialHeader, CredentialStore,
    DependentStateInvalidator, RefreshError, SessionRefresher,
};
use dealroom_domain::{DealroomError, Result as DomainResult};
use tokio::time::Instant;

/// Refresher that replays a script of outcomes, then repeats `fallback`.
pub struct ScriptedRefresher {
    script: Mutex<VecDeque<Result<(), RefreshError>>>,
    fallback: Result<(), RefreshError>,
    latency: Duration,
    calls: Mutex<Vec<Instant>>,
    sign_outs: AtomicUsize,
    observed: Mutex<Option<Arc<MemoryCredentialStore>>>,
    session_at_sign_out: Mutex<Option<bool>>,
}

impl ScriptedRefresher {
    pub fn new(fallback: Result<(), RefreshError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            sign_outs: AtomicUsize::new(0),
            observed: Mutex::new(None),
            session_at_sign_out: Mutex::new(None),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Ok(()))
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self::new(Err(status_error(status)))
    }

    /// Outcomes returned before falling back
    pub fn then(self, outcome: Result<(), RefreshError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Simulated identity-provider round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Record whether `store` still held a session when sign-out ran
    pub fn observe(&self, store: Arc<MemoryCredentialStore>) {
        *self.observed.lock().unwrap() = Some(store);
    }

    pub fn session_at_sign_out(&self) -> Option<bool> {
        *self.session_at_sign_out.lock().unwrap()
    }
}

#[async_trait]
impl SessionRefresher for ScriptedRefresher {
    async fn refresh_session(&self) -> Result<(), RefreshError> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }

    async fn sign_out(&self) -> Result<(), RefreshError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if let Some(store) = self.observed.lock().unwrap().as_ref() {
            *self.session_at_sign_out.lock().unwrap() = Some(store.has_session());
        }
        Err(RefreshError::Transport("sign-out endpoint unreachable".into()))
    }
}

pub fn status_error(status: u16) -> RefreshError {
    RefreshError::Status { status, message: format!("status {status}") }
}

/// Credential store holding marker names per scope.
#[derive(Default)]
pub struct MemoryCredentialStore {
    markers: Mutex<Vec<(CookieScope, String)>>,
    cleared_scopes: Mutex<Vec<CookieScope>>,
}

impl MemoryCredentialStore {
    pub fn with_marker(scope: CookieScope, name: &str) -> Self {
        let store = Self::default();
        store.markers.lock().unwrap().push((scope, name.to_string()));
        store
    }

    pub fn add(&self, scope: CookieScope, name: &str) {
        self.markers.lock().unwrap().push((scope, name.to_string()));
    }

    pub fn cleared_scopes(&self) -> Vec<CookieScope> {
        self.cleared_scopes.lock().unwrap().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn has_session(&self) -> bool {
        !self.markers.lock().unwrap().is_empty()
    }

    fn clear(&self, scopes: &[CookieScope]) -> usize {
        self.cleared_scopes.lock().unwrap().extend(scopes.iter().cloned());
        let mut markers = self.markers.lock().unwrap();
        let before = markers.len();
        markers.retain(|(stored, _)| !scopes.iter().any(|scope| scope.covers(stored)));
        before - markers.len()
    }

    fn credential_header(&self, _host: &str) -> Option<CredentialHeader> {
        let markers = self.markers.lock().unwrap();
        let value =
            markers.iter().map(|(_, name)| format!("{name}=1")).collect::<Vec<_>>().join("; ");
        (!value.is_empty()).then(|| CredentialHeader { name: "cookie".to_string(), value })
    }
}

/// Invalidator counting notifications and claim reloads.
#[derive(Default)]
pub struct RecordingInvalidator {
    notifications: AtomicUsize,
    reloads: AtomicUsize,
    fail_reload: bool,
}

impl RecordingInvalidator {
    pub fn failing_reload() -> Self {
        Self { fail_reload: true, ..Default::default() }
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependentStateInvalidator for RecordingInvalidator {
    async fn notify_permanent_failure(&self) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }

    async fn reload_claims(&self) -> DomainResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reload {
            Err(DealroomError::Auth("claims service unavailable".into()))
        } else {
            Ok(())
        }
    }
}

/// Resolver returning a fixed domain
pub struct FixedResolver(pub Option<String>);

impl CookieDomainResolver for FixedResolver {
    fn resolve_cookie_domain(&self) -> Option<String> {
        self.0.clone()
    }
}

pub fn resolver(domain: &str) -> Arc<FixedResolver> {
    Arc::new(FixedResolver(Some(domain.to_string())))
}
