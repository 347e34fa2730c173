//! API-specific error types
//!
//! Provides error classification for dispatched requests with retry metadata.

use std::time::Duration;

use dealroom_core::SessionError;
use dealroom_domain::DealroomError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403)
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration errors - non-retryable
    Config,
    /// Session torn down or signed out - non-retryable, sign in again
    Session,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Session ended: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Session(_) => ApiErrorCategory::Session,
        }
    }

    /// Check if the caller may retry this error on its own.
    ///
    /// Authentication errors are not retryable here: the dispatcher has
    /// already refreshed the session and replayed the request once.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// Get suggested retry delay in seconds
    pub fn retry_delay_secs(&self) -> u64 {
        match self.category() {
            ApiErrorCategory::RateLimit => 60, // Wait for rate limit window
            ApiErrorCategory::Server => 10,    // Moderate delay for server issues
            ApiErrorCategory::Network => 5,    // Quick retry for network
            ApiErrorCategory::Authentication
            | ApiErrorCategory::Client
            | ApiErrorCategory::Config
            | ApiErrorCategory::Session => 0, // No retry
        }
    }

    /// Whether the session is gone and the user must sign in again
    pub fn requires_sign_in(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Authentication | ApiErrorCategory::Session)
    }
}

impl From<DealroomError> for ApiError {
    fn from(err: DealroomError) -> Self {
        match err {
            DealroomError::Network(message) => Self::Network(message),
            DealroomError::Auth(message) | DealroomError::Session(message) => Self::Auth(message),
            DealroomError::Config(message) => Self::Config(message),
            DealroomError::InvalidInput(message) => Self::Client(message),
            DealroomError::Internal(message) => Self::Server(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use dealroom_core::FailureKind;

    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ApiError::Auth("test".to_string()).category(),
            ApiErrorCategory::Authentication
        );
        assert_eq!(
            ApiError::RateLimit("test".to_string()).category(),
            ApiErrorCategory::RateLimit
        );
        assert_eq!(ApiError::Server("test".to_string()).category(), ApiErrorCategory::Server);
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(1)).category(),
            ApiErrorCategory::Network
        );
        assert_eq!(
            ApiError::from(SessionError::SignedOut).category(),
            ApiErrorCategory::Session
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::RateLimit("test".to_string()).should_retry());
        assert!(ApiError::Server("test".to_string()).should_retry());
        assert!(ApiError::Network("test".to_string()).should_retry());
        assert!(!ApiError::Auth("test".to_string()).should_retry());
        assert!(!ApiError::Client("test".to_string()).should_retry());
        assert!(!ApiError::Config("test".to_string()).should_retry());

        let terminal = ApiError::from(SessionError::Terminal {
            kind: FailureKind::RetryableServer,
            attempts: 3,
            reason: "503".into(),
        });
        assert!(!terminal.should_retry());
        assert!(terminal.requires_sign_in());
    }

    #[test]
    fn test_retry_delays() {
        assert_eq!(ApiError::RateLimit("test".to_string()).retry_delay_secs(), 60);
        assert_eq!(ApiError::Server("test".to_string()).retry_delay_secs(), 10);
        assert_eq!(ApiError::Network("test".to_string()).retry_delay_secs(), 5);
        assert_eq!(ApiError::Client("test".to_string()).retry_delay_secs(), 0);
        assert_eq!(ApiError::from(SessionError::Interrupted).retry_delay_secs(), 0);
    }

    #[test]
    fn domain_errors_map_to_categories() {
        assert!(matches!(
            ApiError::from(DealroomError::Network("down".into())),
            ApiError::Network(_)
        ));
        assert!(matches!(
            ApiError::from(DealroomError::InvalidInput("bad".into())),
            ApiError::Client(_)
        ));
    }
}
