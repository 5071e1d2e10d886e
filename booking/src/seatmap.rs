//! The availability projector.
//!
//! Composes the seatmap view from the durable store (confirmed seats), the
//! coordinator (held seats), and the static theatre profile, with a short
//! cache in front. Every reservation-core transition invalidates the cache,
//! so worst-case staleness is one cache TTL.

use std::collections::BTreeSet;

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::providers::{BookingRepository, SeatCoordinator};
use crate::state::{SeatId, Seatmap, ShowId};

/// Read-side composer of seat availability.
#[derive(Clone)]
pub struct AvailabilityProjector<C, R>
where
    C: SeatCoordinator + Clone,
    R: BookingRepository + Clone,
{
    coordinator: C,
    repository: R,
    config: BookingConfig,
}

impl<C, R> AvailabilityProjector<C, R>
where
    C: SeatCoordinator + Clone,
    R: BookingRepository + Clone,
{
    /// Create a projector over its collaborators.
    pub const fn new(coordinator: C, repository: R, config: BookingConfig) -> Self {
        Self {
            coordinator,
            repository,
            config,
        }
    }

    /// The composed seatmap for a show.
    ///
    /// Cache hits are returned verbatim. On a miss the view is rebuilt and
    /// cached; a cache write failure degrades to uncached reads.
    ///
    /// # Errors
    ///
    /// [`BookingError::ShowNotFound`] for an unknown show, or a transient
    /// coordinator/store error.
    pub async fn get_seatmap(&self, show_id: ShowId) -> Result<Seatmap> {
        match self.coordinator.cached_seatmap(show_id).await {
            Ok(Some(seatmap)) => {
                tracing::debug!(show_id = %show_id, "Seatmap served from cache");
                return Ok(seatmap);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(show_id = %show_id, error = %e, "Seatmap cache read failed");
            }
        }

        let show = self
            .repository
            .show_by_id(show_id)
            .await?
            .ok_or(BookingError::ShowNotFound)?;

        let profile = self.config.profile_for(&show.theatre_id);
        let confirmed = self.repository.confirmed_seats(show_id).await?;
        let held = self.coordinator.locked_seats(show_id).await?;

        let unavailable: BTreeSet<SeatId> = confirmed
            .into_iter()
            .chain(profile.permanently_unavailable.iter().cloned())
            .collect();

        let seatmap = Seatmap {
            show_id,
            movie_title: show.movie_title,
            theatre_name: show.theatre_name,
            start_time: show.start_time,
            price: show.price,
            layout: profile.layout(),
            unavailable_seat_ids: unavailable.into_iter().collect(),
            held_seat_ids: held,
        };

        if let Err(e) = self
            .coordinator
            .cache_seatmap(&seatmap, self.config.seatmap_cache_ttl)
            .await
        {
            tracing::warn!(show_id = %show_id, error = %e, "Seatmap cache write failed");
        }

        Ok(seatmap)
    }
}
