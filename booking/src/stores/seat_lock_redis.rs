//! Redis-based seat coordinator implementation.
//!
//! The single serialization point for seat contention. Redis executes one
//! script at a time, so the check-N/set-N acquire and the owner-checked
//! release below are observably indivisible with respect to any concurrent
//! operation on overlapping keys.
//!
//! # Key space
//!
//! - `seat_lock:{show_id}:{seat_id}` → `"{user_id}:{hold_id}"`, TTL-bounded
//! - `hold:{hold_id}` → JSON hold record, TTL-bounded
//! - `seatmap:{show_id}` → JSON seatmap, short TTL

use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::error::{BookingError, Result};
use crate::providers::{AcquireOutcome, SeatCoordinator};
use crate::state::{Hold, HoldId, SeatId, Seatmap, ShowId, UserId};

/// Check every seat, then lock every seat, in one indivisible step.
///
/// KEYS are the full `seat_lock:` keys in request order. Returns 0 on
/// success, or the 1-based index of the first seat owned by another user.
/// A lock already owned by the caller is re-acquirable (TTL refresh).
const ACQUIRE_SCRIPT: &str = r"
local owner = ARGV[1]
local value = ARGV[2]
local ttl = tonumber(ARGV[3])

for i, key in ipairs(KEYS) do
    local existing = redis.call('GET', key)
    if existing then
        local existing_owner = string.match(existing, '^([^:]+)')
        if existing_owner ~= owner then
            return i
        end
    end
end

for i, key in ipairs(KEYS) do
    redis.call('SET', key, value, 'EX', ttl)
end

return 0
";

/// Delete each lock only if the caller owns it; skip the rest silently.
/// Returns the 1-based indices of the keys actually deleted.
const RELEASE_SCRIPT: &str = r"
local owner = ARGV[1]
local released = {}

for i, key in ipairs(KEYS) do
    local existing = redis.call('GET', key)
    if existing and string.match(existing, '^([^:]+)') == owner then
        redis.call('DEL', key)
        table.insert(released, i)
    end
end

return released
";

/// Redis-backed [`SeatCoordinator`].
///
/// Uses `ConnectionManager` for connection pooling and server-side Lua for
/// the atomic sections. Expiry is passive: locks and holds vanish when their
/// TTL elapses with no further action.
#[derive(Clone)]
pub struct RedisSeatCoordinator {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSeatCoordinator {
    /// Create a new Redis seat coordinator.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Coordinator`] if the connection fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            BookingError::Coordinator(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            BookingError::Coordinator(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    fn seat_lock_key(show_id: ShowId, seat_id: &SeatId) -> String {
        format!("seat_lock:{show_id}:{seat_id}")
    }

    fn hold_key(hold_id: HoldId) -> String {
        format!("hold:{hold_id}")
    }

    fn seatmap_key(show_id: ShowId) -> String {
        format!("seatmap:{show_id}")
    }

    /// Clamp a chrono duration to a positive whole-second Redis TTL.
    fn ttl_seconds(ttl: Duration) -> u64 {
        #[allow(clippy::cast_sign_loss)]
        let seconds = ttl.num_seconds().max(1) as u64;
        seconds
    }
}

impl SeatCoordinator for RedisSeatCoordinator {
    async fn acquire_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        hold_id: HoldId,
        seat_ids: &[SeatId],
        ttl: Duration,
    ) -> Result<AcquireOutcome> {
        let mut conn = self.conn_manager.clone();
        let lock_value = format!("{user_id}:{hold_id}");
        let ttl_seconds = Self::ttl_seconds(ttl);

        let script = Script::new(ACQUIRE_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for seat_id in seat_ids {
            invocation.key(Self::seat_lock_key(show_id, seat_id));
        }
        invocation
            .arg(user_id.as_str())
            .arg(&lock_value)
            .arg(ttl_seconds);

        let conflict_index: i64 = invocation.invoke_async(&mut conn).await.map_err(|e| {
            BookingError::Coordinator(format!("Failed to lock seats atomically: {e}"))
        })?;

        if conflict_index == 0 {
            tracing::debug!(
                show_id = %show_id,
                user_id = %user_id,
                hold_id = %hold_id,
                seat_count = seat_ids.len(),
                ttl_seconds = ttl_seconds,
                "Locked seats atomically"
            );
            metrics::counter!("booking.coordinator.acquired").increment(1);
            Ok(AcquireOutcome::Acquired { expires_in: ttl })
        } else {
            #[allow(clippy::cast_sign_loss)]
            let index = (conflict_index - 1) as usize;
            let seat = seat_ids.get(index).cloned().ok_or_else(|| {
                BookingError::Coordinator(format!(
                    "Acquire script returned out-of-range index {conflict_index}"
                ))
            })?;
            metrics::counter!("booking.coordinator.conflicts").increment(1);
            Ok(AcquireOutcome::Conflict { seat })
        }
    }

    async fn release_seats(
        &self,
        show_id: ShowId,
        user_id: &UserId,
        seat_ids: &[SeatId],
    ) -> Result<Vec<SeatId>> {
        let mut conn = self.conn_manager.clone();

        let script = Script::new(RELEASE_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for seat_id in seat_ids {
            invocation.key(Self::seat_lock_key(show_id, seat_id));
        }
        invocation.arg(user_id.as_str());

        let released_indices: Vec<i64> = invocation.invoke_async(&mut conn).await.map_err(|e| {
            BookingError::Coordinator(format!("Failed to release seats atomically: {e}"))
        })?;

        let released: Vec<SeatId> = released_indices
            .into_iter()
            .filter_map(|i| {
                #[allow(clippy::cast_sign_loss)]
                let index = (i - 1).max(0) as usize;
                seat_ids.get(index).cloned()
            })
            .collect();

        tracing::debug!(
            show_id = %show_id,
            user_id = %user_id,
            released_count = released.len(),
            "Released seat locks"
        );

        Ok(released)
    }

    async fn put_hold(&self, hold: &Hold, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::hold_key(hold.hold_id);
        let json = serde_json::to_string(hold)
            .map_err(|e| BookingError::Serialization(e.to_string()))?;

        let _: () = conn
            .set_ex(&key, json, Self::ttl_seconds(ttl))
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to store hold: {e}")))?;

        Ok(())
    }

    async fn get_hold(&self, hold_id: HoldId) -> Result<Option<Hold>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::hold_key(hold_id);

        let json: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to get hold: {e}")))?;

        match json {
            Some(json) => {
                let hold = serde_json::from_str(&json)
                    .map_err(|e| BookingError::Serialization(e.to_string()))?;
                Ok(Some(hold))
            }
            None => Ok(None),
        }
    }

    async fn delete_hold(&self, hold_id: HoldId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::hold_key(hold_id);

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to delete hold: {e}")))?;

        Ok(())
    }

    async fn locked_seats(&self, show_id: ShowId) -> Result<Vec<SeatId>> {
        let mut conn = self.conn_manager.clone();
        let pattern = format!("seat_lock:{show_id}:*");

        let keys: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(&pattern).await.map_err(|e| {
                BookingError::Coordinator(format!("Failed to scan seat locks: {e}"))
            })?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut seats: Vec<SeatId> = keys
            .iter()
            .filter_map(|key| key.rsplit(':').next())
            .filter_map(|suffix| SeatId::parse(suffix).ok())
            .collect();
        seats.sort();

        Ok(seats)
    }

    async fn cached_seatmap(&self, show_id: ShowId) -> Result<Option<Seatmap>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::seatmap_key(show_id);

        let json: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to get cached seatmap: {e}")))?;

        match json {
            Some(json) => {
                let seatmap = serde_json::from_str(&json)
                    .map_err(|e| BookingError::Serialization(e.to_string()))?;
                Ok(Some(seatmap))
            }
            None => Ok(None),
        }
    }

    async fn cache_seatmap(&self, seatmap: &Seatmap, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::seatmap_key(seatmap.show_id);
        let json = serde_json::to_string(seatmap)
            .map_err(|e| BookingError::Serialization(e.to_string()))?;

        let _: () = conn
            .set_ex(&key, json, Self::ttl_seconds(ttl))
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to cache seatmap: {e}")))?;

        Ok(())
    }

    async fn invalidate_seatmap(&self, show_id: ShowId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::seatmap_key(show_id);

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| BookingError::Coordinator(format!("Failed to invalidate seatmap: {e}")))?;

        Ok(())
    }
}
