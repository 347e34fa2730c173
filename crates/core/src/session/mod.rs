//! Session refresh coordination
//!
//! Keeps exactly one refresh of the portal session in flight no matter how
//! many requests notice the expiry at once.
//!
//! ```text
//! dispatch ──401──► SessionRefreshCoordinator ──► SessionRefresher (x max_attempts)
//!                         │          │
//!                         │          └──► FailureClassifier + RetryPolicy
//!                         │
//!                         └──(terminal)──► CredentialStore::clear
//!                                          SessionRefresher::sign_out
//!                                          DependentStateInvalidator::notify_permanent_failure
//! ```

pub mod classifier;
pub mod coordinator;
pub mod credentials;
pub mod errors;
pub mod invalidation;
pub mod policy;

pub use classifier::{AttemptClass, FailureClassifier, FailureKind};
pub use coordinator::{
    CycleOutcome, RefreshState, RefreshStats, SessionRefreshCoordinator,
    SessionRefreshCoordinatorBuilder,
};
pub use credentials::{CookieDomains, CookieScope, MarkerConvention, MarkerPredicate};
pub use errors::{SessionError, SessionResult};
pub use invalidation::{InvalidatorSet, NoopInvalidator};
pub use policy::RetryPolicy;
