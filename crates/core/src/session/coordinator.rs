//! Single-flight session refresh coordinator
//!
//! Any number of request paths may call
//! [`SessionRefreshCoordinator::ensure_fresh_session`] concurrently. The first
//! caller to find the coordinator `Idle` becomes the sole executor of a refresh
//! cycle; everyone arriving while it is `Refreshing` parks a continuation on
//! the waiter queue. When the cycle concludes the state flips back to `Idle`
//! and the queue is drained under the same lock, so every waiter receives the
//! outcome of the cycle it joined and never one from an earlier or later cycle.
//!
//! ```text
//! Idle ──trigger──► Refreshing ──success──────────────► Idle
//!                       └──────exhausted / permanent──► Idle (+ teardown)
//! ```
//!
//! The lock is never held across an `.await`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dealroom_domain::{impl_domain_status_conversions, DealroomError, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use super::classifier::{AttemptClass, FailureClassifier, FailureKind};
use super::credentials::CookieDomains;
use super::errors::{SessionError, SessionResult};
use super::invalidation::NoopInvalidator;
use super::policy::RetryPolicy;
use crate::session_ports::{CredentialStore, DependentStateInvalidator, SessionRefresher};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh cycle is running
    Idle,
    /// A cycle is running; new callers wait for its outcome
    Refreshing,
}

impl_domain_status_conversions!(RefreshState {
    Idle => "idle",
    Refreshing => "refreshing",
});

/// How the most recent cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The identity provider issued a new session
    Refreshed,
    /// Attempts ended in a terminal failure and the session was torn down
    Failed(FailureKind),
    /// The session was ended explicitly
    SignedOut,
    /// The executing caller was dropped before the cycle concluded
    Interrupted,
}

impl From<&SessionResult> for CycleOutcome {
    fn from(outcome: &SessionResult) -> Self {
        match outcome {
            Ok(()) => Self::Refreshed,
            Err(SessionError::Terminal { kind, .. }) => Self::Failed(*kind),
            Err(SessionError::SignedOut) => Self::SignedOut,
            Err(SessionError::Interrupted) => Self::Interrupted,
        }
    }
}

/// Counters for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Cycles that ran to completion (successful or terminal)
    pub cycles_completed: u64,
    /// Calls made to the identity provider's refresh operation
    pub refresh_calls: u64,
    /// Cycles that ended in teardown
    pub terminal_failures: u64,
    /// Callers that joined an in-flight cycle instead of starting one
    pub coalesced_callers: u64,
    /// Outcome of the most recent cycle
    pub last_outcome: Option<CycleOutcome>,
    /// When the most recent cycle concluded
    pub last_completed_at: Option<DateTime<Utc>>,
}

struct Inner {
    state: RefreshState,
    waiters: Vec<oneshot::Sender<SessionResult>>,
    stats: RefreshStats,
}

/// Coordinates one in-flight refresh for every concurrent caller.
pub struct SessionRefreshCoordinator {
    refresher: Arc<dyn SessionRefresher>,
    credentials: Arc<dyn CredentialStore>,
    domains: CookieDomains,
    invalidator: Arc<dyn DependentStateInvalidator>,
    policy: RetryPolicy,
    inner: Mutex<Inner>,
}

impl SessionRefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn SessionRefresher>,
        credentials: Arc<dyn CredentialStore>,
        domains: CookieDomains,
        invalidator: Arc<dyn DependentStateInvalidator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            refresher,
            credentials,
            domains,
            invalidator,
            policy,
            inner: Mutex::new(Inner {
                state: RefreshState::Idle,
                waiters: Vec::new(),
                stats: RefreshStats::default(),
            }),
        }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> SessionRefreshCoordinatorBuilder {
        SessionRefreshCoordinatorBuilder::default()
    }

    pub fn state(&self) -> RefreshState {
        self.inner.lock().state
    }

    pub fn stats(&self) -> RefreshStats {
        self.inner.lock().stats.clone()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Ensure the session has been refreshed.
    ///
    /// Starts a refresh cycle when none is running, otherwise waits for the
    /// running one. Every caller of the same cycle receives the same outcome.
    ///
    /// # Errors
    /// Returns [`SessionError::Terminal`] once the session has been torn
    /// down, [`SessionError::SignedOut`] if it was ended explicitly while
    /// waiting, or [`SessionError::Interrupted`] if the executing caller was
    /// dropped mid-cycle.
    #[instrument(skip(self))]
    pub async fn ensure_fresh_session(&self) -> SessionResult {
        let cycle = match self.join_or_start() {
            Ok(cycle) => cycle,
            Err(waiter) => {
                debug!("refresh already in flight, waiting for its outcome");
                return waiter.await.unwrap_or(Err(SessionError::Interrupted));
            }
        };

        let outcome = self.run_cycle().await;
        cycle.finish(&outcome);
        outcome
    }

    /// End the session explicitly (logout).
    ///
    /// Waits for any in-flight refresh cycle, then performs the same teardown
    /// as a terminal refresh failure. Callers that arrive during teardown are
    /// released with [`SessionError::SignedOut`].
    #[instrument(skip(self))]
    pub async fn end_session(&self) {
        let cycle = loop {
            match self.join_or_start() {
                Ok(cycle) => break cycle,
                Err(waiter) => {
                    let _ = waiter.await;
                }
            }
        };

        info!("ending session");
        self.teardown().await;
        cycle.finish(&Err(SessionError::SignedOut));
    }

    /// Either claims the executor role or enqueues a waiter, atomically.
    fn join_or_start(&self) -> std::result::Result<CycleGuard<'_>, oneshot::Receiver<SessionResult>> {
        let mut inner = self.inner.lock();
        match inner.state {
            RefreshState::Idle => {
                inner.state = RefreshState::Refreshing;
                Ok(CycleGuard { inner: &self.inner, finished: false })
            }
            RefreshState::Refreshing => {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                inner.stats.coalesced_callers += 1;
                Err(rx)
            }
        }
    }

    async fn run_cycle(&self) -> SessionResult {
        let max_attempts = self.policy.max_attempts();
        let mut last_kind = FailureKind::TransientNetwork;
        let mut last_reason = String::new();
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            self.inner.lock().stats.refresh_calls += 1;

            let result = self.refresher.refresh_session().await;
            match FailureClassifier::classify(&result) {
                AttemptClass::Success => {
                    info!(attempt, "session refreshed");
                    self.reload_claims().await;
                    return Ok(());
                }
                AttemptClass::Failed(kind) => {
                    let reason = result.err().map(|e| e.to_string()).unwrap_or_default();
                    warn!(attempt, max_attempts, %kind, error = %reason, "session refresh attempt failed");
                    last_kind = kind;
                    last_reason = reason;

                    if !kind.is_retryable() {
                        break;
                    }
                    if let Some(delay) = self.policy.delay_after(attempt) {
                        debug!(attempt, ?delay, "backing off before next refresh attempt");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!(attempts, kind = %last_kind, "session is unrecoverable, tearing down");
        self.teardown().await;
        Err(SessionError::Terminal { kind: last_kind, attempts, reason: last_reason })
    }

    async fn reload_claims(&self) {
        if let Err(err) = self.invalidator.reload_claims().await {
            warn!(error = %err, "claims reload failed after session refresh");
        }
    }

    /// Sign out while the markers are still held, then clear them.
    async fn teardown(&self) {
        if let Err(err) = self.refresher.sign_out().await {
            warn!(error = %err, "best-effort sign-out failed");
        }

        let scopes = self.domains.variants();
        let removed = self.credentials.clear(&scopes);
        info!(removed, scopes = scopes.len(), "cleared session markers");

        self.invalidator.notify_permanent_failure().await;
    }
}

/// Executor role for one cycle.
///
/// Returning to `Idle` and draining the waiters happen under one lock. If the
/// executing future is dropped before [`CycleGuard::finish`], the guard still
/// returns the coordinator to `Idle` and drops every waiter's sender, which
/// releases them with [`SessionError::Interrupted`].
struct CycleGuard<'a> {
    inner: &'a Mutex<Inner>,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(mut self, outcome: &SessionResult) {
        self.finished = true;
        let waiters = self.conclude(CycleOutcome::from(outcome));

        debug!(waiters = waiters.len(), "releasing refresh waiters");
        for waiter in waiters {
            // A waiter whose caller went away has nothing left to notify.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn conclude(&self, outcome: CycleOutcome) -> Vec<oneshot::Sender<SessionResult>> {
        let mut inner = self.inner.lock();
        inner.state = RefreshState::Idle;

        let stats = &mut inner.stats;
        stats.last_outcome = Some(outcome);
        stats.last_completed_at = Some(Utc::now());
        match outcome {
            CycleOutcome::Refreshed => stats.cycles_completed += 1,
            CycleOutcome::Failed(_) => {
                stats.cycles_completed += 1;
                stats.terminal_failures += 1;
            }
            CycleOutcome::SignedOut | CycleOutcome::Interrupted => {}
        }

        std::mem::take(&mut inner.waiters)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let waiters = self.conclude(CycleOutcome::Interrupted);
            warn!(waiters = waiters.len(), "refresh cycle dropped before completion");
        }
    }
}

/// Builder for [`SessionRefreshCoordinator`]
#[derive(Default)]
pub struct SessionRefreshCoordinatorBuilder {
    refresher: Option<Arc<dyn SessionRefresher>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    domains: CookieDomains,
    invalidator: Option<Arc<dyn DependentStateInvalidator>>,
    policy: RetryPolicy,
}

impl SessionRefreshCoordinatorBuilder {
    pub fn refresher(mut self, refresher: Arc<dyn SessionRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn domains(mut self, domains: CookieDomains) -> Self {
        self.domains = domains;
        self
    }

    pub fn invalidator(mut self, invalidator: Arc<dyn DependentStateInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the coordinator
    ///
    /// # Errors
    /// Returns `DealroomError::Config` if the refresher or credential store is
    /// missing.
    pub fn build(self) -> Result<SessionRefreshCoordinator> {
        let refresher = self
            .refresher
            .ok_or_else(|| DealroomError::Config("Session refresher not set".to_string()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| DealroomError::Config("Credential store not set".to_string()))?;
        let invalidator = self.invalidator.unwrap_or_else(|| Arc::new(NoopInvalidator));

        Ok(SessionRefreshCoordinator::new(
            refresher,
            credentials,
            self.domains,
            invalidator,
            self.policy,
        ))
    }
}
