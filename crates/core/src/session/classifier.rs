//! Refresh outcome classification
//!
//! Pure mapping from the result of one refresh call to what the coordinator
//! should do next. No I/O, no state.

use dealroom_domain::impl_domain_status_conversions;

use crate::session_ports::RefreshError;

/// Why a refresh attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No response at all (connection failure, timeout)
    TransientNetwork,
    /// 5xx-equivalent answer from the identity provider
    RetryableServer,
    /// 4xx-equivalent answer: the credential is invalid, revoked or expired
    /// beyond refresh
    PermanentAuth,
}

impl_domain_status_conversions!(FailureKind {
    TransientNetwork => "transient_network",
    RetryableServer => "retryable_server",
    PermanentAuth => "permanent_auth",
});

impl FailureKind {
    /// Whether another refresh attempt may succeed
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::PermanentAuth)
    }
}

/// Classification of a single refresh attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    /// The refresh call succeeded
    Success,
    /// The refresh call failed for the given reason
    Failed(FailureKind),
}

/// Maps refresh outcomes onto [`AttemptClass`]
pub struct FailureClassifier;

impl FailureClassifier {
    /// Classify the result of one refresh call
    pub fn classify<T>(outcome: &Result<T, RefreshError>) -> AttemptClass {
        match outcome {
            Ok(_) => AttemptClass::Success,
            Err(err) => AttemptClass::Failed(Self::classify_error(err)),
        }
    }

    pub fn classify_error(err: &RefreshError) -> FailureKind {
        match err {
            RefreshError::Status { status, .. } => Self::classify_status(*status),
            RefreshError::Transport(_) | RefreshError::Timeout(_) => FailureKind::TransientNetwork,
        }
    }

    /// Status ranges: 4xx is permanent, everything else reported as a
    /// failure is treated as a retryable server fault.
    pub fn classify_status(status: u16) -> FailureKind {
        match status {
            400..=499 => FailureKind::PermanentAuth,
            _ => FailureKind::RetryableServer,
        }
    }
}
