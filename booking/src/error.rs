//! Error types for booking operations.

use thiserror::Error;

use crate::state::{HoldStatus, OrderStatus};

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the reservation core.
///
/// Variants fall into four families: validation (malformed input), lookup
/// (absent or expired entities), conflict (the current state disallows the
/// transition), and transient (a collaborator failed and the call is safe to
/// retry).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    /// Malformed input rejected before any state was touched.
    #[error("{0}")]
    Validation(String),

    /// The show does not exist.
    #[error("Show not found")]
    ShowNotFound,

    /// The hold does not exist, or its TTL elapsed and the record is gone.
    /// The two cases are indistinguishable by design.
    #[error("Hold not found or expired")]
    HoldNotFound,

    /// The order does not exist.
    #[error("Order not found")]
    OrderNotFound,

    /// The entity exists but belongs to a different user.
    #[error("Unauthorized")]
    Forbidden,

    /// Requested seats are already part of a confirmed order.
    #[error("Seats already booked: {}", .seats.join(", "))]
    SeatsAlreadyBooked {
        /// The confirmed seats that intersected the request.
        seats: Vec<String>,
    },

    /// A seat is currently locked by another user.
    #[error("Seat {seat} is no longer available")]
    SeatTaken {
        /// The first conflicting seat, in request order.
        seat: String,
    },

    /// Requested seats are permanently out of service or outside the
    /// auditorium layout.
    #[error("Seats are unavailable: {}", .seats.join(", "))]
    SeatsUnavailable {
        /// The unavailable seats that intersected the request.
        seats: Vec<String>,
    },

    /// The show's start time has passed; it is no longer bookable.
    #[error("Cannot book seats for a show that has already started")]
    ShowStarted,

    /// The hold is not in the `HELD` state required by the transition.
    #[error("Cannot create order from hold with status: {status}")]
    HoldNotHeld {
        /// The hold's current status.
        status: HoldStatus,
    },

    /// The hold was already released.
    #[error("Hold is already released")]
    HoldAlreadyReleased,

    /// The order is not in the `PAYMENT_PENDING` state required by the
    /// transition.
    #[error("Cannot confirm payment for order with status: {status}")]
    OrderNotPending {
        /// The order's current status.
        status: OrderStatus,
    },

    /// The hold's TTL elapsed between validation and action.
    #[error("Hold has expired")]
    HoldExpired,

    /// The order's payment window elapsed.
    #[error("Order has expired")]
    OrderExpired,

    /// The ephemeral coordinator failed or timed out.
    #[error("Coordinator error: {0}")]
    Coordinator(String),

    /// The durable store failed or timed out.
    #[error("Database error: {0}")]
    Database(String),

    /// A value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The event bus rejected a publication. Never surfaced to callers;
    /// the core logs and continues.
    #[error("Event bus error: {0}")]
    EventBus(String),
}

impl BookingError {
    /// Returns `true` if the failure is safe to retry as-is.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Coordinator(_) | Self::Database(_) | Self::Serialization(_) | Self::EventBus(_)
        )
    }

    /// Returns `true` if this error is due to invalid or conflicting user
    /// input rather than a system fault.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !self.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_messages_name_seats() {
        let err = BookingError::SeatsAlreadyBooked {
            seats: vec!["A1".into(), "A2".into()],
        };
        assert_eq!(err.to_string(), "Seats already booked: A1, A2");

        let err = BookingError::SeatTaken { seat: "B3".into() };
        assert_eq!(err.to_string(), "Seat B3 is no longer available");
    }

    #[test]
    fn transient_classification() {
        assert!(BookingError::Coordinator("timeout".into()).is_transient());
        assert!(BookingError::Database("pool exhausted".into()).is_transient());
        assert!(!BookingError::Forbidden.is_transient());
        assert!(BookingError::ShowStarted.is_user_error());
    }
}
