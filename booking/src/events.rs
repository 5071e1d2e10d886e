//! Lifecycle events emitted after successful transitions.
//!
//! Delivery is best-effort and at-least-once: publication failure never
//! fails the request that produced the event, and downstream consumers must
//! deduplicate on `hold_id`/`order_id`. Each payload carries the denormalized
//! show context notification consumers need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::state::{Customer, HoldId, OrderId, SeatId, ShowId, UserId};

/// Hold lifecycle payload (`hold.created`, `hold.expired`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldEventData {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// Owner of the hold.
    pub user_id: UserId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Seats covered by the hold.
    pub seat_ids: Vec<SeatId>,
    /// When the hold expires.
    pub expires_at: DateTime<Utc>,
    /// Movie title for notification templates.
    pub movie_title: String,
    /// Theatre name for notification templates.
    pub theatre_name: String,
}

/// `hold.released` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldReleasedData {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// Owner of the hold.
    pub user_id: UserId,
    /// The show the seats belonged to.
    pub show_id: ShowId,
    /// Seats covered by the hold.
    pub seat_ids: Vec<SeatId>,
    /// Seats whose locks were actually deleted.
    pub released_seats: Vec<SeatId>,
}

/// `order.created` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// Order identifier.
    pub order_id: OrderId,
    /// Owner of the order.
    pub user_id: UserId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Booked seats.
    pub seat_ids: Vec<SeatId>,
    /// Total amount due.
    pub amount: f64,
    /// Customer contact details.
    pub customer: Customer,
    /// End of the payment window.
    pub expires_at: DateTime<Utc>,
    /// Movie title for notification templates.
    pub movie_title: String,
    /// Theatre name for notification templates.
    pub theatre_name: String,
}

/// `order.confirmed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    /// Order identifier.
    pub order_id: OrderId,
    /// Owner of the order.
    pub user_id: UserId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Booked seats.
    pub seat_ids: Vec<SeatId>,
    /// Amount paid.
    pub amount: f64,
    /// The issued ticket code.
    pub ticket_code: String,
    /// Customer contact details.
    pub customer: Customer,
    /// Show start time.
    pub show_time: DateTime<Utc>,
    /// Movie title for notification templates.
    pub movie_title: String,
    /// Theatre name for notification templates.
    pub theatre_name: String,
}

/// `show.sold_out` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSoldOutData {
    /// The show with no sellable seats left.
    pub show_id: ShowId,
    /// Movie title for notification templates.
    pub movie_title: String,
    /// Theatre name for notification templates.
    pub theatre_name: String,
    /// Show start time.
    pub start_time: DateTime<Utc>,
}

/// A lifecycle event ready for publication.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingEvent {
    /// Seats were locked and a hold created.
    HoldCreated(HoldEventData),
    /// A hold was explicitly released.
    HoldReleased(HoldReleasedData),
    /// A hold was observed to have lapsed on a write-path touch.
    HoldExpired(HoldEventData),
    /// An order entered the payment window.
    OrderCreated(OrderCreatedData),
    /// Payment was confirmed and a ticket issued.
    OrderConfirmed(OrderConfirmedData),
    /// The show has no sellable seats left.
    ShowSoldOut(ShowSoldOutData),
}

impl BookingEvent {
    /// The wire event type.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::HoldCreated(_) => "hold.created",
            Self::HoldReleased(_) => "hold.released",
            Self::HoldExpired(_) => "hold.expired",
            Self::OrderCreated(_) => "order.created",
            Self::OrderConfirmed(_) => "order.confirmed",
            Self::ShowSoldOut(_) => "show.sold_out",
        }
    }

    /// Partitioning key: the id of the entity the event is about.
    ///
    /// Events for the same hold/order/show land on the same partition, which
    /// preserves their relative order for consumers.
    #[must_use]
    pub fn entity_key(&self) -> String {
        match self {
            Self::HoldCreated(d) | Self::HoldExpired(d) => d.hold_id.to_string(),
            Self::HoldReleased(d) => d.hold_id.to_string(),
            Self::OrderCreated(d) => d.order_id.to_string(),
            Self::OrderConfirmed(d) => d.order_id.to_string(),
            Self::ShowSoldOut(d) => d.show_id.to_string(),
        }
    }

    /// The payload as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Serialization`] if encoding fails.
    pub fn data(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::HoldCreated(d) | Self::HoldExpired(d) => serde_json::to_value(d),
            Self::HoldReleased(d) => serde_json::to_value(d),
            Self::OrderCreated(d) => serde_json::to_value(d),
            Self::OrderConfirmed(d) => serde_json::to_value(d),
            Self::ShowSoldOut(d) => serde_json::to_value(d),
        };
        value.map_err(|e| BookingError::Serialization(e.to_string()))
    }
}

/// Wire envelope: `{eventType, timestamp, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event type, e.g. `hold.created`.
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Publication timestamp, UTC.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Wrap an event for publication, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Serialization`] if the payload cannot be
    /// encoded.
    pub fn wrap(event: &BookingEvent) -> Result<Self> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            timestamp: Utc::now(),
            data: event.data()?,
        })
    }
}
