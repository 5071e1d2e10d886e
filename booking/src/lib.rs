//! # Boxoffice Booking
//!
//! The booking core of a movie-ticket service: an atomic, concurrency-safe
//! seat-reservation state machine.
//!
//! ## Guarantees
//!
//! - No two users ever simultaneously hold or book the same seat: every
//!   multi-seat acquisition is a single indivisible check-and-set in the
//!   coordinator.
//! - Every hold either converts into an order or lapses at its TTL; a client
//!   that disappears mid-flow cannot leave a permanent lock.
//! - Confirmed bookings are durable and final; in-flight holds are not.
//!
//! ## Architecture
//!
//! ```text
//! create-hold ──► Hold (HELD) ──create-order──► Order (PAYMENT_PENDING)
//!      │               │                              │
//!      │          release/TTL                    confirm/TTL
//!      ▼               ▼                              ▼
//!  SeatLocks       RELEASED/gone               CONFIRMED/EXPIRED
//! ```
//!
//! The [`ReservationCore`] orchestrates three injected collaborators: a
//! [`providers::SeatCoordinator`] (Redis) resolving seat contention, a
//! [`providers::BookingRepository`] (PostgreSQL) holding durable orders, and
//! a [`providers::EventPublisher`] (Kafka) receiving best-effort lifecycle
//! events. The [`AvailabilityProjector`] composes the read-side seatmap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod events;
pub mod providers;
pub mod reservations;
pub mod seatmap;
pub mod state;
pub mod stores;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::{BookingConfig, TheatreProfile};
pub use error::{BookingError, Result};
pub use reservations::{
    CreateHoldRequest, CreateOrderRequest, OrderDetails, ReleasedHold, ReservationCore,
};
pub use seatmap::AvailabilityProjector;
pub use state::{
    Customer, Hold, HoldId, HoldStatus, Order, OrderId, OrderStatus, SeatId, Seatmap, Show,
    ShowId, ShowStatus, UserId,
};
