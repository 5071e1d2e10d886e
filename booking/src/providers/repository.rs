//! Durable store trait.

use crate::error::Result;
use crate::state::{Order, OrderId, SeatId, Show, ShowId};

/// Transactional persistence for orders and read access to show metadata.
///
/// The store is the source of truth for confirmed bookings. Confirmation is
/// a compare-and-set scoped to `PAYMENT_PENDING`, so a row is confirmed at
/// most once no matter how many callers race.
pub trait BookingRepository: Send + Sync {
    /// Fetch a show with its denormalized movie and theatre context.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the store is unreachable.
    async fn show_by_id(&self, show_id: ShowId) -> Result<Option<Show>>;

    /// The union of seat ids across the show's `CONFIRMED` orders.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the store is unreachable.
    async fn confirmed_seats(&self, show_id: ShowId) -> Result<Vec<SeatId>>;

    /// Persist a new order in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the insert fails; no partial row is left
    /// behind.
    async fn create_order(&self, order: &Order) -> Result<()>;

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// Returns a transient error if the store is unreachable.
    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Confirm payment: set `CONFIRMED` and the ticket code iff the order is
    /// still `PAYMENT_PENDING`. Returns `false` when the compare-and-set
    /// matched zero rows (someone else transitioned it, or it expired).
    ///
    /// # Errors
    ///
    /// Returns a transient error if the update fails; the transaction rolls
    /// back and the order is left untouched.
    async fn confirm_order_payment(&self, order: &Order, ticket_code: &str) -> Result<bool>;
}
