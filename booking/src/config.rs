//! Booking configuration.
//!
//! TTLs, booking limits, and the per-theatre seating profiles. Values are
//! provided by the application at startup; nothing here reads the
//! environment.

use chrono::Duration;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::state::{SeatId, SeatInfo, SeatKind};

/// Static seating profile for one theatre.
///
/// Supplies the seat layout shown on the seatmap and the set of seats that
/// may never be locked or booked (broken seats, maintenance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheatreProfile {
    /// Number of rows, labelled `A` upward. At most 26.
    pub rows: u8,
    /// Seats per row, numbered from 1.
    pub seats_per_row: u8,
    /// Seats permanently out of service.
    pub permanently_unavailable: BTreeSet<SeatId>,
}

impl TheatreProfile {
    /// Create a profile with no out-of-service seats.
    #[must_use]
    pub const fn new(rows: u8, seats_per_row: u8) -> Self {
        Self {
            rows,
            seats_per_row,
            permanently_unavailable: BTreeSet::new(),
        }
    }

    /// Mark seats as permanently out of service.
    #[must_use]
    pub fn with_unavailable(mut self, seats: impl IntoIterator<Item = SeatId>) -> Self {
        self.permanently_unavailable.extend(seats);
        self
    }

    /// Total number of physical seats.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.rows as usize * self.seats_per_row as usize
    }

    /// Number of seats that can ever be sold.
    #[must_use]
    pub fn sellable_capacity(&self) -> usize {
        self.capacity()
            .saturating_sub(self.permanently_unavailable.len())
    }

    /// Whether the seat exists in this auditorium.
    #[must_use]
    pub fn contains(&self, seat: &SeatId) -> bool {
        let row_index = (seat.row() as u8).wrapping_sub(b'A');
        row_index < self.rows && seat.number() >= 1 && seat.number() <= self.seats_per_row
    }

    /// The flat seat layout, row by row.
    #[must_use]
    pub fn layout(&self) -> Vec<SeatInfo> {
        let mut layout = Vec::with_capacity(self.capacity());
        for row_index in 0..self.rows.min(26) {
            let row = (b'A' + row_index) as char;
            for number in 1..=self.seats_per_row {
                let Ok(seat_id) = SeatId::parse(&format!("{row}{number}")) else {
                    continue;
                };
                layout.push(SeatInfo {
                    seat_id,
                    row,
                    number,
                    kind: SeatKind::Regular,
                });
            }
        }
        layout
    }
}

impl Default for TheatreProfile {
    /// Ten rows (`A`-`J`) of ten seats, with `A5`, `B10` and `C8` out of
    /// service.
    fn default() -> Self {
        let unavailable = ["A5", "B10", "C8"]
            .iter()
            .filter_map(|s| SeatId::parse(s).ok())
            .collect();
        Self {
            rows: 10,
            seats_per_row: 10,
            permanently_unavailable: unavailable,
        }
    }
}

/// Reservation-core configuration.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Hold time-to-live. Seat locks and hold records expire together.
    ///
    /// Default: 300 seconds.
    pub hold_ttl: Duration,

    /// Payment window for pending orders. Seat locks are refreshed to this
    /// TTL at order creation so seats stay reserved through payment.
    ///
    /// Default: 300 seconds.
    pub order_ttl: Duration,

    /// Maximum seats per hold.
    ///
    /// Default: 10.
    pub max_seats_per_booking: usize,

    /// Seatmap cache time-to-live. Short, so held-seat staleness stays
    /// bounded even without an invalidation.
    ///
    /// Default: 10 seconds.
    pub seatmap_cache_ttl: Duration,

    /// Seating profiles keyed by theatre ID.
    pub theatres: HashMap<Uuid, TheatreProfile>,

    /// Profile used for theatres without a dedicated entry.
    pub default_profile: TheatreProfile,
}

impl BookingConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hold time-to-live.
    #[must_use]
    pub fn with_hold_ttl(mut self, ttl: Duration) -> Self {
        self.hold_ttl = ttl;
        self
    }

    /// Set the order payment window.
    #[must_use]
    pub fn with_order_ttl(mut self, ttl: Duration) -> Self {
        self.order_ttl = ttl;
        self
    }

    /// Set the per-booking seat ceiling.
    #[must_use]
    pub fn with_max_seats_per_booking(mut self, max: usize) -> Self {
        self.max_seats_per_booking = max;
        self
    }

    /// Set the seatmap cache time-to-live.
    #[must_use]
    pub fn with_seatmap_cache_ttl(mut self, ttl: Duration) -> Self {
        self.seatmap_cache_ttl = ttl;
        self
    }

    /// Register a theatre-specific seating profile.
    #[must_use]
    pub fn with_theatre_profile(mut self, theatre_id: Uuid, profile: TheatreProfile) -> Self {
        self.theatres.insert(theatre_id, profile);
        self
    }

    /// Replace the fallback seating profile.
    #[must_use]
    pub fn with_default_profile(mut self, profile: TheatreProfile) -> Self {
        self.default_profile = profile;
        self
    }

    /// The seating profile for a theatre.
    #[must_use]
    pub fn profile_for(&self, theatre_id: &Uuid) -> &TheatreProfile {
        self.theatres.get(theatre_id).unwrap_or(&self.default_profile)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_ttl: Duration::seconds(300),
            order_ttl: Duration::seconds(300),
            max_seats_per_booking: 10,
            seatmap_cache_ttl: Duration::seconds(10),
            theatres: HashMap::new(),
            default_profile: TheatreProfile::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = BookingConfig::new()
            .with_hold_ttl(Duration::seconds(120))
            .with_order_ttl(Duration::seconds(600))
            .with_max_seats_per_booking(4);

        assert_eq!(config.hold_ttl, Duration::seconds(120));
        assert_eq!(config.order_ttl, Duration::seconds(600));
        assert_eq!(config.max_seats_per_booking, 4);
        assert_eq!(config.seatmap_cache_ttl, Duration::seconds(10));
    }

    #[test]
    fn default_profile_matches_original_values() {
        let profile = TheatreProfile::default();
        assert_eq!(profile.capacity(), 100);
        assert_eq!(profile.sellable_capacity(), 97);
        for seat in ["A5", "B10", "C8"] {
            assert!(
                profile
                    .permanently_unavailable
                    .contains(&SeatId::parse(seat).unwrap())
            );
        }
    }

    #[test]
    fn profile_membership() {
        let profile = TheatreProfile::new(5, 8);
        assert!(profile.contains(&SeatId::parse("A1").unwrap()));
        assert!(profile.contains(&SeatId::parse("E8").unwrap()));
        assert!(!profile.contains(&SeatId::parse("F1").unwrap()));
        assert!(!profile.contains(&SeatId::parse("A9").unwrap()));
    }

    #[test]
    fn layout_covers_every_seat_once() {
        let profile = TheatreProfile::new(2, 3);
        let layout = profile.layout();
        let ids: Vec<&str> = layout.iter().map(|s| s.seat_id.as_str()).collect();
        assert_eq!(ids, ["A1", "A2", "A3", "B1", "B2", "B3"]);
    }

    #[test]
    fn theatre_lookup_falls_back_to_default() {
        let theatre = Uuid::new_v4();
        let config = BookingConfig::new()
            .with_theatre_profile(theatre, TheatreProfile::new(3, 4));

        assert_eq!(config.profile_for(&theatre).capacity(), 12);
        assert_eq!(config.profile_for(&Uuid::new_v4()).capacity(), 100);
    }
}
