//! Seat coordinator trait.

use chrono::Duration;

use crate::error::Result;
use crate::state::{Hold, HoldId, SeatId, Seatmap, ShowId, UserId};

/// Outcome of an atomic multi-seat acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Every requested seat is now locked by the caller.
    Acquired {
        /// Time until the locks lapse.
        expires_in: Duration,
    },
    /// Another user holds at least one requested seat; nothing was written.
    Conflict {
        /// The first conflicting seat, in request order.
        seat: SeatId,
    },
}

/// The single serialization point for seat-level contention.
///
/// # Implementation notes
///
/// - `acquire` and `release` must be observably indivisible with respect to
///   any concurrent call on overlapping keys: check all seats, then write
///   all seats, with nothing interleaved. A partial acquisition (some seats
///   locked, failure reported) is forbidden.
/// - Lock ownership is `(user_id, hold_id)`; a lock is never overwritten
///   with a different owner. Re-acquisition by the same user refreshes the
///   TTL and succeeds.
/// - Holds and locks expire passively; a missing hold is indistinguishable
///   from an expired one.
pub trait SeatCoordinator: Send + Sync {
    /// Atomically lock `seat_ids` for `(user_id, hold_id)` with the given
    /// TTL, or report the first seat held by someone else.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable; no locks
    /// are left behind in that case.
    async fn acquire_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        hold_id: HoldId,
        seat_ids: &[SeatId],
        ttl: Duration,
    ) -> Result<AcquireOutcome>;

    /// Atomically delete the locks on `seat_ids` that `user_id` owns,
    /// skipping the rest silently. Returns the seats actually released.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn release_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        seat_ids: &[SeatId],
    ) -> Result<Vec<SeatId>>;

    /// Store a hold record with the given TTL, replacing any existing record
    /// under the same id.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn put_hold(&self, hold: &Hold, ttl: Duration) -> Result<()>;

    /// Fetch a hold record. `None` covers both "never existed" and
    /// "TTL elapsed".
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn get_hold(&self, hold_id: HoldId) -> Result<Option<Hold>>;

    /// Delete a hold record. Deleting a missing hold is not an error.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn delete_hold(&self, hold_id: HoldId) -> Result<()>;

    /// Enumerate the seats currently locked for a show.
    ///
    /// May be eventually consistent against in-flight acquisitions; only the
    /// availability view reads it.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn locked_seats(&self, show_id: ShowId) -> Result<Vec<SeatId>>;

    /// Fetch the cached seatmap for a show, if present.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn cached_seatmap(&self, show_id: ShowId) -> Result<Option<Seatmap>>;

    /// Cache a composed seatmap with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn cache_seatmap(&self, seatmap: &Seatmap, ttl: Duration) -> Result<()>;

    /// Drop the cached seatmap for a show, if present.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the coordinator is unreachable.
    async fn invalidate_seatmap(&self, show_id: ShowId) -> Result<()>;
}
