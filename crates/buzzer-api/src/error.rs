//! Error types for the buzzer API.
//!
//! [`ApiError`] converts every failure into a JSON body of the form
//! `{"error": message, "status": code}`. Press rejections also carry a
//! machine-readable `"reason"` so clients can tell them apart.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use buzzer_core::ServiceError;
use buzzer_ledger::RegistryError;
use buzzer_types::RejectionReason;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid admin credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A request value was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// HTTP status for a press rejection.
pub const fn rejection_status(reason: RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::BuzzerDisabled => StatusCode::LOCKED,
        RejectionReason::UnknownParticipant => StatusCode::NOT_FOUND,
        RejectionReason::AlreadyPressed => StatusCode::CONFLICT,
    }
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Rejected(rejected)) => rejection_status(rejected.reason),
            Self::Service(ServiceError::Registry(RegistryError::AlreadyRegistered { .. })) => {
                StatusCode::CONFLICT
            }
            Self::Service(ServiceError::Registry(_)) | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(ServiceError::NotAuthorized(_)) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Service(ServiceError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let (Self::Service(ServiceError::Rejected(rejected)), Some(map)) =
            (&self, body.as_object_mut())
        {
            map.insert(
                String::from("reason"),
                serde_json::Value::from(rejected.reason.code()),
            );
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use buzzer_ledger::{NotAuthorized, PressRejected};

    use super::*;

    #[test]
    fn rejection_statuses() {
        assert_eq!(
            ApiError::from(ServiceError::from(PressRejected::DISABLED)).status(),
            StatusCode::LOCKED
        );
        assert_eq!(
            ApiError::from(ServiceError::from(PressRejected::UNKNOWN)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ServiceError::from(PressRejected::DUPLICATE)).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn other_statuses() {
        assert_eq!(
            ApiError::from(ServiceError::from(NotAuthorized)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(ServiceError::Registry(RegistryError::InvalidName {
                reason: "empty",
            }))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ServiceError::Storage(String::from("down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
