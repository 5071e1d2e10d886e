//! In-memory mock providers for testing.
//!
//! The mocks honor the same contracts as the production stores: the
//! coordinator resolves contention atomically (one mutex guards the whole
//! check-and-set), expiry is passive, and the repository's confirmation is a
//! compare-and-set. Failure toggles let tests exercise the compensation
//! paths.

mod coordinator;
mod events;
mod repository;

pub use coordinator::MockSeatCoordinator;
pub use events::MockEventPublisher;
pub use repository::MockBookingRepository;
