//! Mock seat coordinator for testing.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{BookingError, Result};
use crate::providers::{AcquireOutcome, SeatCoordinator};
use crate::state::{Hold, HoldId, SeatId, Seatmap, ShowId, UserId};

#[derive(Debug, Clone)]
struct LockEntry {
    owner: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    locks: HashMap<(ShowId, SeatId), LockEntry>,
    holds: HashMap<HoldId, (Hold, DateTime<Utc>)>,
    seatmaps: HashMap<ShowId, (Seatmap, DateTime<Utc>)>,
}

impl CoordinatorState {
    /// Drop everything whose TTL has lapsed. Mirrors passive Redis expiry.
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.locks.retain(|_, entry| entry.expires_at > now);
        self.holds.retain(|_, (_, expires)| *expires > now);
        self.seatmaps.retain(|_, (_, expires)| *expires > now);
    }
}

/// Mock seat coordinator.
///
/// A single mutex guards every operation, which gives the same
/// "check-N, set-N, indivisible" semantics as the Lua scripts.
#[derive(Debug, Clone, Default)]
pub struct MockSeatCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    fail_put_hold: Arc<AtomicBool>,
}

impl MockSeatCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `put_hold` call fail, to drive the hold-store
    /// compensation path.
    pub fn fail_next_put_hold(&self) {
        self.fail_put_hold.store(true, Ordering::SeqCst);
    }

    /// The current owner of a seat lock, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn lock_owner(&self, show_id: ShowId, seat_id: &SeatId) -> Result<Option<UserId>> {
        let mut state = self.lock_state()?;
        state.purge_expired(Utc::now());
        Ok(state
            .locks
            .get(&(show_id, seat_id.clone()))
            .map(|entry| entry.owner.clone()))
    }

    /// Number of live seat locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn lock_count(&self) -> Result<usize> {
        let mut state = self.lock_state()?;
        state.purge_expired(Utc::now());
        Ok(state.locks.len())
    }

    /// Move a stored hold's `expires_at` into the past without touching its
    /// record TTL, so reads observe the `EXPIRED` projection.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn backdate_hold(&self, hold_id: HoldId, by: Duration) -> Result<()> {
        let mut state = self.lock_state()?;
        if let Some((hold, _)) = state.holds.get_mut(&hold_id) {
            hold.expires_at = hold.expires_at - by;
        }
        Ok(())
    }

    /// Age every lock of a show so the next purge drops them, simulating
    /// TTL expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn expire_locks(&self, show_id: ShowId) -> Result<()> {
        let mut state = self.lock_state()?;
        let past = Utc::now() - Duration::seconds(1);
        for ((show, _), entry) in &mut state.locks {
            if *show == show_id {
                entry.expires_at = past;
            }
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, CoordinatorState>> {
        self.state
            .lock()
            .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))
    }
}

impl SeatCoordinator for MockSeatCoordinator {
    fn acquire_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        _hold_id: HoldId,
        seat_ids: &[SeatId],
        ttl: Duration,
    ) -> impl Future<Output = Result<AcquireOutcome>> + Send {
        let state = Arc::clone(&self.state);
        let user_id = user_id.clone();
        let seat_ids = seat_ids.to_vec();

        async move {
            let now = Utc::now();
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.purge_expired(now);

            // Phase 1: every seat must be free or already ours.
            for seat_id in &seat_ids {
                if let Some(entry) = state.locks.get(&(show_id, seat_id.clone())) {
                    if entry.owner != user_id {
                        return Ok(AcquireOutcome::Conflict {
                            seat: seat_id.clone(),
                        });
                    }
                }
            }

            // Phase 2: lock them all.
            for seat_id in &seat_ids {
                state.locks.insert(
                    (show_id, seat_id.clone()),
                    LockEntry {
                        owner: user_id.clone(),
                        expires_at: now + ttl,
                    },
                );
            }

            Ok(AcquireOutcome::Acquired { expires_in: ttl })
        }
    }

    fn release_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        seat_ids: &[SeatId],
    ) -> impl Future<Output = Result<Vec<SeatId>>> + Send {
        let state = Arc::clone(&self.state);
        let user_id = user_id.clone();
        let seat_ids = seat_ids.to_vec();

        async move {
            let now = Utc::now();
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.purge_expired(now);

            let mut released = Vec::new();
            for seat_id in &seat_ids {
                let key = (show_id, seat_id.clone());
                if state
                    .locks
                    .get(&key)
                    .is_some_and(|entry| entry.owner == user_id)
                {
                    state.locks.remove(&key);
                    released.push(seat_id.clone());
                }
            }

            Ok(released)
        }
    }

    fn put_hold(&self, hold: &Hold, ttl: Duration) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let fail = Arc::clone(&self.fail_put_hold);
        let hold = hold.clone();

        async move {
            if fail.swap(false, Ordering::SeqCst) {
                return Err(BookingError::Coordinator(
                    "Simulated put_hold failure".to_string(),
                ));
            }

            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state
                .holds
                .insert(hold.hold_id, (hold, Utc::now() + ttl));
            Ok(())
        }
    }

    fn get_hold(&self, hold_id: HoldId) -> impl Future<Output = Result<Option<Hold>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.purge_expired(Utc::now());
            Ok(state.holds.get(&hold_id).map(|(hold, _)| hold.clone()))
        }
    }

    fn delete_hold(&self, hold_id: HoldId) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.holds.remove(&hold_id);
            Ok(())
        }
    }

    fn locked_seats(&self, show_id: ShowId) -> impl Future<Output = Result<Vec<SeatId>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.purge_expired(Utc::now());

            let mut seats: Vec<SeatId> = state
                .locks
                .keys()
                .filter(|(show, _)| *show == show_id)
                .map(|(_, seat)| seat.clone())
                .collect();
            seats.sort();
            Ok(seats)
        }
    }

    fn cached_seatmap(
        &self,
        show_id: ShowId,
    ) -> impl Future<Output = Result<Option<Seatmap>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.purge_expired(Utc::now());
            Ok(state.seatmaps.get(&show_id).map(|(map, _)| map.clone()))
        }
    }

    fn cache_seatmap(
        &self,
        seatmap: &Seatmap,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let seatmap = seatmap.clone();

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state
                .seatmaps
                .insert(seatmap.show_id, (seatmap, Utc::now() + ttl));
            Ok(())
        }
    }

    fn invalidate_seatmap(&self, show_id: ShowId) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Coordinator("Mutex lock failed".to_string()))?;
            state.seatmaps.remove(&show_id);
            Ok(())
        }
    }
}
