//! Session coordination errors

use thiserror::Error;

use super::classifier::FailureKind;

/// Outcome of a refresh cycle as seen by every caller of that cycle
pub type SessionResult = Result<(), SessionError>;

/// Terminal outcomes of the session refresh coordinator.
///
/// Callers should not retry on their own after receiving any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The refresh cycle failed and the local session has been torn down
    #[error("session could not be refreshed after {attempts} attempt(s) ({kind}): {reason}")]
    Terminal { kind: FailureKind, attempts: u32, reason: String },

    /// The session was ended explicitly while the caller was waiting
    #[error("session was signed out")]
    SignedOut,

    /// The task driving the refresh cycle was dropped before it finished
    #[error("session refresh was interrupted before completing")]
    Interrupted,
}

impl SessionError {
    /// Failure classification of the last refresh attempt, if one ran
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Terminal { kind, .. } => Some(*kind),
            Self::SignedOut | Self::Interrupted => None,
        }
    }
}
