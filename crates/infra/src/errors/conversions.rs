//! Conversions from external infrastructure errors into domain errors.

use dealroom_domain::DealroomError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DealroomError);

impl From<InfraError> for DealroomError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DealroomError> for InfraError {
    fn from(value: DealroomError) -> Self {
        InfraError(value)
    }
}

trait IntoDealroomError {
    fn into_dealroom(self) -> DealroomError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DealroomError */
/* -------------------------------------------------------------------------- */

impl IntoDealroomError for HttpError {
    fn into_dealroom(self) -> DealroomError {
        if self.is_timeout() {
            return DealroomError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DealroomError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return DealroomError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => DealroomError::Auth(message),
                400..=499 => DealroomError::InvalidInput(message),
                _ => DealroomError::Network(message),
            };
        }

        DealroomError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_dealroom())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
