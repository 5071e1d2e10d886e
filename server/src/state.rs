//! Application state shared by the handlers.

use boxoffice_booking::stores::{
    KafkaEventPublisher, PostgresBookingRepository, RedisSeatCoordinator,
};
use boxoffice_booking::{AvailabilityProjector, BookingConfig, ReservationCore};

/// The production reservation core instantiation.
pub type Reservations =
    ReservationCore<RedisSeatCoordinator, PostgresBookingRepository, KafkaEventPublisher>;

/// The production availability projector instantiation.
pub type Availability = AvailabilityProjector<RedisSeatCoordinator, PostgresBookingRepository>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The reservation state machine.
    pub reservations: Reservations,
    /// The read-side seatmap composer.
    pub availability: Availability,
}

impl AppState {
    /// Assemble the state from its connected collaborators.
    #[must_use]
    pub fn new(
        coordinator: RedisSeatCoordinator,
        repository: PostgresBookingRepository,
        events: KafkaEventPublisher,
        config: BookingConfig,
    ) -> Self {
        Self {
            reservations: ReservationCore::new(
                coordinator.clone(),
                repository.clone(),
                events,
                config.clone(),
            ),
            availability: AvailabilityProjector::new(coordinator, repository, config),
        }
    }
}
