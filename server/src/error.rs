//! Error types for the HTTP handlers.
//!
//! Bridges [`BookingError`] to HTTP responses. Conflict and validation
//! errors surface their domain message; transient collaborator failures are
//! logged and reported as a generic 503 so internals never leak.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boxoffice_booking::BookingError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    status: StatusCode,
    /// Error code (for client error handling).
    code: &'static str,
    /// Error message (user-facing).
    message: String,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message.into())
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.into())
    }

    /// The HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        use BookingError as E;

        let (status, code) = match &err {
            E::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            E::ShowNotFound | E::HoldNotFound | E::OrderNotFound => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            E::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            E::SeatsAlreadyBooked { .. } => (StatusCode::CONFLICT, "SEATS_ALREADY_BOOKED"),
            E::SeatTaken { .. } => (StatusCode::CONFLICT, "SEAT_HELD"),
            E::SeatsUnavailable { .. } => (StatusCode::BAD_REQUEST, "SEATS_UNAVAILABLE"),
            E::ShowStarted => (StatusCode::BAD_REQUEST, "SHOW_STARTED"),
            E::HoldNotHeld { .. } | E::OrderNotPending { .. } => {
                (StatusCode::CONFLICT, "CONFLICT_STATE")
            }
            E::HoldAlreadyReleased => (StatusCode::BAD_REQUEST, "ALREADY_RELEASED"),
            E::HoldExpired | E::OrderExpired => (StatusCode::BAD_REQUEST, "EXPIRED"),
            E::Coordinator(_) | E::Database(_) | E::Serialization(_) | E::EventBus(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        };

        let message = if err.is_transient() {
            "Service temporarily unavailable, please retry".to_string()
        } else {
            err.to_string()
        };

        Self::new(status, code, message)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                "Request failed"
            );
        }

        let body = ErrorResponse {
            code: self.code.to_string(),
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_booking::{HoldStatus, OrderStatus};

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::from(BookingError::Validation("bad".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn conflicts_map_to_409() {
        let err = ApiError::from(BookingError::SeatTaken { seat: "A1".into() });
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(BookingError::SeatsAlreadyBooked {
            seats: vec!["A1".into()],
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(BookingError::OrderNotPending {
            status: OrderStatus::Confirmed,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unavailable_started_and_expired_map_to_400() {
        for err in [
            BookingError::SeatsUnavailable {
                seats: vec!["A5".into()],
            },
            BookingError::ShowStarted,
            BookingError::HoldExpired,
            BookingError::OrderExpired,
            BookingError::HoldAlreadyReleased,
            BookingError::HoldNotHeld {
                status: HoldStatus::Released,
            },
        ] {
            let status = ApiError::from(err).status();
            assert!(
                status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT,
                "unexpected status {status}"
            );
        }
    }

    #[test]
    fn lookups_and_ownership() {
        assert_eq!(
            ApiError::from(BookingError::HoldNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(BookingError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn transient_errors_hide_details() {
        let err = ApiError::from(BookingError::Database("connection refused".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message.contains("connection refused"));
    }
}
