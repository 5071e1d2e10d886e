//! Mock booking repository for testing.

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{BookingError, Result};
use crate::providers::BookingRepository;
use crate::state::{Order, OrderId, OrderStatus, SeatId, Show, ShowId};

#[derive(Debug, Default)]
struct RepositoryState {
    shows: HashMap<ShowId, Show>,
    orders: HashMap<OrderId, Order>,
}

/// Mock booking repository.
///
/// Confirmation follows the production compare-and-set semantics, including
/// the defence-in-depth rejection of a seat that another confirmed order of
/// the same show already contains.
#[derive(Debug, Clone, Default)]
pub struct MockBookingRepository {
    state: Arc<Mutex<RepositoryState>>,
    fail_create_order: Arc<AtomicBool>,
}

impl MockBookingRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a show.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn insert_show(&self, show: Show) -> Result<()> {
        self.lock_state()?.shows.insert(show.show_id, show);
        Ok(())
    }

    /// Make the next `create_order` call fail, to drive the order-insert
    /// compensation path.
    pub fn fail_next_create_order(&self) {
        self.fail_create_order.store(true, Ordering::SeqCst);
    }

    /// A stored order, for assertions.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn stored_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.lock_state()?.orders.get(&order_id).cloned())
    }

    /// Number of stored orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn order_count(&self) -> Result<usize> {
        Ok(self.lock_state()?.orders.len())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, RepositoryState>> {
        self.state
            .lock()
            .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))
    }
}

impl BookingRepository for MockBookingRepository {
    fn show_by_id(&self, show_id: ShowId) -> impl Future<Output = Result<Option<Show>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let state = state
                .lock()
                .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))?;
            Ok(state.shows.get(&show_id).cloned())
        }
    }

    fn confirmed_seats(
        &self,
        show_id: ShowId,
    ) -> impl Future<Output = Result<Vec<SeatId>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let state = state
                .lock()
                .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))?;
            let seats: BTreeSet<SeatId> = state
                .orders
                .values()
                .filter(|order| {
                    order.show_id == show_id && order.status == OrderStatus::Confirmed
                })
                .flat_map(|order| order.seat_ids.iter().cloned())
                .collect();
            Ok(seats.into_iter().collect())
        }
    }

    fn create_order(&self, order: &Order) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let fail = Arc::clone(&self.fail_create_order);
        let order = order.clone();

        async move {
            if fail.swap(false, Ordering::SeqCst) {
                return Err(BookingError::Database(
                    "Simulated create_order failure".to_string(),
                ));
            }

            let mut state = state
                .lock()
                .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))?;
            if state.orders.contains_key(&order.order_id) {
                return Err(BookingError::Database("Order already exists".to_string()));
            }
            state.orders.insert(order.order_id, order);
            Ok(())
        }
    }

    fn order_by_id(&self, order_id: OrderId) -> impl Future<Output = Result<Option<Order>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let state = state
                .lock()
                .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))?;
            Ok(state.orders.get(&order_id).cloned())
        }
    }

    fn confirm_order_payment(
        &self,
        order: &Order,
        ticket_code: &str,
    ) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);
        let order_id = order.order_id;
        let ticket_code = ticket_code.to_string();

        async move {
            let mut state = state
                .lock()
                .map_err(|_| BookingError::Database("Mutex lock failed".to_string()))?;

            let Some(stored) = state.orders.get(&order_id) else {
                return Ok(false);
            };
            if stored.status != OrderStatus::PaymentPending {
                return Ok(false);
            }

            // Defence-in-depth: reject a seat another confirmed order of
            // the show already contains, like the confirmed_seats table.
            let stored = stored.clone();
            let clash = state.orders.values().any(|other| {
                other.order_id != order_id
                    && other.show_id == stored.show_id
                    && other.status == OrderStatus::Confirmed
                    && other.seat_ids.iter().any(|s| stored.seat_ids.contains(s))
            });
            if clash {
                return Err(BookingError::Database(
                    "Seat already confirmed for this show".to_string(),
                ));
            }

            if let Some(stored) = state.orders.get_mut(&order_id) {
                stored.status = OrderStatus::Confirmed;
                stored.ticket_code = Some(ticket_code);
                stored.updated_at = Utc::now();
            }
            Ok(true)
        }
    }
}
