//! Session ports consumed by the refresh coordinator.
//!
//! The coordinator never talks to the identity provider, the credential jar or
//! the business stores directly. Each of them sits behind one of these traits
//! and is wired in at startup.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use dealroom_core::{RefreshError, SessionRefresher};
//!
//! struct AlwaysFresh;
//!
//! #[async_trait]
//! impl SessionRefresher for AlwaysFresh {
//!     async fn refresh_session(&self) -> Result<(), RefreshError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use dealroom_domain::Result;
use thiserror::Error;

use crate::session::CookieScope;

/// Failure reported by a single refresh call.
///
/// Cloneable so that one outcome can be reported to every caller waiting on
/// the same refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The identity provider answered with a non-success status
    #[error("identity provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// No response was received (connection refused, reset, DNS, ...)
    #[error("refresh transport failure: {0}")]
    Transport(String),

    /// The refresh call did not complete within its deadline
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for exchanging the current session for a new one.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Exchange the existing (possibly near-expired) session for a new one.
    ///
    /// Implementations persist the new session markers themselves, so the
    /// next dispatched request picks them up. They must bound the call with
    /// their own timeout and report it as [`RefreshError::Timeout`].
    ///
    /// # Errors
    /// Returns a classifiable [`RefreshError`] on any failure.
    async fn refresh_session(&self) -> std::result::Result<(), RefreshError>;

    /// Best-effort local sign-out, invoked during terminal teardown.
    ///
    /// # Errors
    /// Failures are logged by the caller and otherwise ignored.
    async fn sign_out(&self) -> std::result::Result<(), RefreshError> {
        Ok(())
    }
}

/// Port resolving the session-scope domain of the current deployment.
pub trait CookieDomainResolver: Send + Sync {
    /// Domain the session markers are scoped to, or `None` for host-only
    /// markers.
    fn resolve_cookie_domain(&self) -> Option<String>;
}

/// Header carrying the session on an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHeader {
    pub name: String,
    pub value: String,
}

/// Port over the locally held session markers.
///
/// Cookie jars are the primary back end; header-token stores or platform
/// keychains can implement the same contract.
pub trait CredentialStore: Send + Sync {
    /// Cheap presence check for at least one session marker. Never validates
    /// the marker contents.
    fn has_session(&self) -> bool;

    /// Remove every session marker from each of the given scopes.
    ///
    /// Returns the number of markers removed.
    fn clear(&self, scopes: &[CookieScope]) -> usize;

    /// Header to attach to a request targeting `host`, if any credentials
    /// apply to it.
    fn credential_header(&self, host: &str) -> Option<CredentialHeader>;
}

/// Port to the business-state stores that depend on the session.
#[async_trait]
pub trait DependentStateInvalidator: Send + Sync {
    /// Reset every dependent store to its logged-out representation.
    async fn notify_permanent_failure(&self);

    /// Reload authorization claims derived from the session.
    ///
    /// # Errors
    /// Failures are logged by the coordinator and never fail a refresh.
    async fn reload_claims(&self) -> Result<()>;
}
