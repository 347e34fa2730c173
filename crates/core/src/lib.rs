//! # Dealroom Core
//!
//! Session coordination logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the identity provider, credential storage
//!   and dependent business stores
//! - The refresh failure classifier and retry policy
//! - The single-flight session refresh coordinator
//!
//! ## Architecture Principles
//! - Only depends on `dealroom-domain`
//! - No HTTP, cookie-jar or platform code
//! - All external dependencies via traits
//! - Pure, testable coordination logic

pub mod session;

// Infrastructure ports
pub mod session_ports;

pub use session::{
    AttemptClass, CookieDomains, CookieScope, CycleOutcome, FailureClassifier, FailureKind,
    InvalidatorSet, MarkerConvention, MarkerPredicate, NoopInvalidator, RefreshState,
    RefreshStats, RetryPolicy, SessionError, SessionRefreshCoordinator,
    SessionRefreshCoordinatorBuilder, SessionResult,
};
pub use session_ports::{
    CookieDomainResolver, CredentialHeader, CredentialStore, DependentStateInvalidator,
    RefreshError, SessionRefresher,
};
