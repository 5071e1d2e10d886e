//! Collaborator traits for the reservation core.
//!
//! One trait per external system: the ephemeral coordinator (seat locks,
//! holds, seatmap cache), the durable store (shows, orders), and the event
//! bus. Production implementations live in [`crate::stores`]; in-memory
//! test doubles in [`crate::mocks`].

mod event_publisher;
mod repository;
mod seat_coordinator;

pub use event_publisher::EventPublisher;
pub use repository::BookingRepository;
pub use seat_coordinator::{AcquireOutcome, SeatCoordinator};
