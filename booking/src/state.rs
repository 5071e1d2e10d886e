//! Domain types for the reservation core.
//!
//! Identifiers are newtypes over [`Uuid`] (shows, holds, orders) or opaque
//! strings (users, seats). Statuses that clients observe carry a read-time
//! `EXPIRED` projection computed from `expires_at`; the projection is never
//! written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{BookingError, Result};
use crate::utils;

/// Unique show identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub Uuid);

impl ShowId {
    /// Generate a new random show ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique hold identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(pub Uuid);

impl HoldId {
    /// Generate a new random hold ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HoldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Generate a new random order ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive the ticket code for this order: `"BMS"` followed by the first
    /// eight hex characters of the ID, uppercased.
    #[must_use]
    pub fn ticket_code(&self) -> String {
        let hex = self.0.simple().to_string();
        format!("BMS{}", hex[..8].to_uppercase())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque user identifier, as decoded upstream from the caller's token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a pre-validated user identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A seat identifier of the form `<row letter><1-99>`, e.g. `A1` or `J10`.
///
/// Seat identity is scoped to a show: the same string under two shows is a
/// different lock subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    /// Parse and validate a seat identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the string is not a row letter
    /// followed by a number between 1 and 99 (no leading zero).
    pub fn parse(s: &str) -> Result<Self> {
        if utils::is_valid_seat_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(BookingError::Validation(format!(
                "Invalid seat ID format: {s}"
            )))
        }
    }

    /// The seat ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The row letter.
    #[must_use]
    pub fn row(&self) -> char {
        // Parse guarantees an ASCII uppercase first byte.
        self.0.as_bytes()[0] as char
    }

    /// The seat number within the row.
    #[must_use]
    pub fn number(&self) -> u8 {
        self.0[1..].parse().unwrap_or(0)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Show lifecycle status as recorded in the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShowStatus {
    /// The show is scheduled and bookable until its start time.
    Scheduled,
    /// The show was cancelled.
    Cancelled,
}

impl ShowStatus {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Database`] on an unknown status string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(BookingError::Database(format!(
                "Unknown show status: {other}"
            ))),
        }
    }
}

/// A scheduled screening. Read-only to the reservation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    /// Show identifier.
    pub show_id: ShowId,
    /// Title of the movie being screened.
    pub movie_title: String,
    /// Theatre identifier; keys the seating profile lookup.
    pub theatre_id: Uuid,
    /// Theatre display name.
    pub theatre_name: String,
    /// Start time; doubles as the booking cutoff.
    pub start_time: DateTime<Utc>,
    /// Price per seat.
    pub price: f64,
    /// Lifecycle status.
    pub status: ShowStatus,
}

/// Hold lifecycle status.
///
/// `Expired` is a read-time projection: the stored record only ever carries
/// `Held` or `Released`, and a hold whose TTL elapses simply disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStatus {
    /// Seats are locked for this hold.
    Held,
    /// The hold was explicitly released; its seat locks are gone.
    Released,
    /// The hold outlived its TTL (observed on read, never stored).
    Expired,
}

impl fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Held => "HELD",
            Self::Released => "RELEASED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// A time-limited reservation of seats by a user, pending order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Owner of the hold; the only user allowed to act on it.
    pub user_id: UserId,
    /// Seats covered by the hold. Non-empty, duplicate-free.
    pub seat_ids: Vec<SeatId>,
    /// Stored status (`Held` or `Released`).
    pub status: HoldStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp; ages together with the record's TTL.
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    /// The status a reader should observe at `now`.
    ///
    /// A held hold past its expiry reports `Expired` without any state write.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> HoldStatus {
        if self.status == HoldStatus::Held && now > self.expires_at {
            HoldStatus::Expired
        } else {
            self.status
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The order is awaiting payment confirmation.
    PaymentPending,
    /// Payment confirmed; the booking is final. There is no transition out.
    Confirmed,
    /// The payment window elapsed.
    Expired,
    /// The order was cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Database`] on an unknown status string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PAYMENT_PENDING" => Ok(Self::PaymentPending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "EXPIRED" => Ok(Self::Expired),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(BookingError::Database(format!(
                "Unknown order status: {other}"
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer contact details captured at order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Email address for ticket delivery.
    pub email: String,
    /// Phone number for SMS notifications.
    pub phone: String,
}

impl Customer {
    /// Validate the contact details.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.name.len() > 200 {
            return Err(BookingError::Validation("Invalid customer name".into()));
        }
        if !utils::is_valid_email(&self.email) {
            return Err(BookingError::Validation("Invalid email format".into()));
        }
        if !utils::is_valid_phone(&self.phone) {
            return Err(BookingError::Validation(
                "Invalid phone number format".into(),
            ));
        }
        Ok(())
    }
}

/// A durable record of intent to pay for specific seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub order_id: OrderId,
    /// Owner of the order.
    pub user_id: UserId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Booked seats. Disjoint from every other confirmed order of the show.
    pub seat_ids: Vec<SeatId>,
    /// Customer contact details.
    pub customer: Customer,
    /// Total amount: seat count times the show price at order time.
    pub amount: f64,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Ticket code; present iff the order is confirmed.
    pub ticket_code: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// End of the payment window.
    pub expires_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The status a reader should observe at `now`.
    ///
    /// A pending order past its payment window reports `Expired`; the stored
    /// row is reconciled on the next write-path touch, not here.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> OrderStatus {
        if self.status == OrderStatus::PaymentPending && now > self.expires_at {
            OrderStatus::Expired
        } else {
            self.status
        }
    }
}

/// Seat category within the auditorium layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatKind {
    /// Standard seat.
    Regular,
    /// Premium seat.
    Premium,
    /// Wheelchair-accessible seat.
    Accessible,
}

/// One entry of the static seat layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInfo {
    /// Seat identifier.
    pub seat_id: SeatId,
    /// Row letter.
    pub row: char,
    /// Seat number within the row.
    pub number: u8,
    /// Seat category.
    #[serde(rename = "type")]
    pub kind: SeatKind,
}

/// The composed, read-optimized view of a show's seat availability.
///
/// `unavailable_seat_ids` is the union of confirmed and permanently
/// out-of-service seats; seats held by in-flight holds are reported
/// separately so clients can distinguish "booked" from "held by someone".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seatmap {
    /// Show identifier.
    pub show_id: ShowId,
    /// Movie title, denormalized for display.
    pub movie_title: String,
    /// Theatre name, denormalized for display.
    pub theatre_name: String,
    /// Show start time.
    pub start_time: DateTime<Utc>,
    /// Price per seat.
    pub price: f64,
    /// Static seat layout.
    pub layout: Vec<SeatInfo>,
    /// Confirmed plus permanently unavailable seats.
    pub unavailable_seat_ids: Vec<SeatId>,
    /// Seats currently locked by in-flight holds.
    pub held_seat_ids: Vec<SeatId>,
}
