//! # Boxoffice Server
//!
//! The HTTP surface for the Boxoffice reservation core: an axum router over
//! [`boxoffice_booking::ReservationCore`] and
//! [`boxoffice_booking::AvailabilityProjector`], wired to Redis, PostgreSQL,
//! and a Kafka-compatible event bus at startup.
//!
//! Identity arrives pre-decoded in the `x-user-id` header; request bodies
//! are decoded into typed DTOs and validated at the boundary before they
//! reach the core.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
