//! The reservation core.
//!
//! Drives the hold → order → confirmation lifecycle against the coordinator,
//! the durable store, and the event bus, with stage-local compensation on
//! transient failures. Validation and conflict rejections never mutate
//! state; event publication and cache invalidation are best-effort and never
//! fail a request.

use chrono::Utc;

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::events::{
    BookingEvent, HoldEventData, HoldReleasedData, OrderConfirmedData, OrderCreatedData,
    ShowSoldOutData,
};
use crate::providers::{AcquireOutcome, BookingRepository, EventPublisher, SeatCoordinator};
use crate::state::{
    Customer, Hold, HoldId, HoldStatus, Order, OrderId, OrderStatus, SeatId, Show, ShowId, UserId,
};
use crate::utils;

/// Request to hold seats for a show.
#[derive(Debug, Clone)]
pub struct CreateHoldRequest {
    /// The show to hold seats for.
    pub show_id: ShowId,
    /// Seats to lock, duplicate-free.
    pub seat_ids: Vec<SeatId>,
    /// Declared seat count; must match `seat_ids.len()`.
    pub quantity: usize,
}

/// Request to convert a hold into an order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// The hold to convert.
    pub hold_id: HoldId,
    /// Customer contact details.
    pub customer: Customer,
}

/// Result of releasing a hold.
#[derive(Debug, Clone)]
pub struct ReleasedHold {
    /// The hold, now in `RELEASED` state.
    pub hold: Hold,
    /// The seats whose locks were actually deleted.
    pub released_seats: Vec<SeatId>,
}

/// An order together with its show context, for denormalized responses.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    /// The order.
    pub order: Order,
    /// The show the order belongs to.
    pub show: Show,
}

/// The seat-reservation state machine.
///
/// All shared state lives in the coordinator and the durable store, so any
/// number of core instances can process requests in parallel; no in-process
/// lock is ever held across an await point.
#[derive(Clone)]
pub struct ReservationCore<C, R, P>
where
    C: SeatCoordinator + Clone,
    R: BookingRepository + Clone,
    P: EventPublisher + Clone,
{
    coordinator: C,
    repository: R,
    events: P,
    config: BookingConfig,
}

impl<C, R, P> ReservationCore<C, R, P>
where
    C: SeatCoordinator + Clone,
    R: BookingRepository + Clone,
    P: EventPublisher + Clone,
{
    /// Create a reservation core over its collaborators.
    pub const fn new(coordinator: C, repository: R, events: P, config: BookingConfig) -> Self {
        Self {
            coordinator,
            repository,
            events,
            config,
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Hold seats for a show.
    ///
    /// Locks every requested seat atomically, writes the hold record, then
    /// invalidates the seatmap cache and emits `hold.created`. If the hold
    /// record cannot be written the locks are released again, so no partial
    /// state survives.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] on malformed input
    /// - [`BookingError::ShowNotFound`] / [`BookingError::ShowStarted`]
    /// - [`BookingError::SeatsAlreadyBooked`] when seats intersect a
    ///   confirmed order
    /// - [`BookingError::SeatsUnavailable`] for out-of-service or
    ///   out-of-layout seats
    /// - [`BookingError::SeatTaken`] when another user's lock won the race
    /// - transient coordinator/store errors
    pub async fn create_hold(&self, user_id: &UserId, request: CreateHoldRequest) -> Result<Hold> {
        utils::validate_user_id(user_id.as_str())?;
        utils::validate_hold_seats(
            &request.seat_ids,
            request.quantity,
            self.config.max_seats_per_booking,
        )?;

        let show = self
            .repository
            .show_by_id(request.show_id)
            .await?
            .ok_or(BookingError::ShowNotFound)?;

        if Utc::now() >= show.start_time {
            return Err(BookingError::ShowStarted);
        }

        let profile = self.config.profile_for(&show.theatre_id);
        let confirmed = self.repository.confirmed_seats(request.show_id).await?;

        let booked: Vec<String> = request
            .seat_ids
            .iter()
            .filter(|&seat| confirmed.contains(seat))
            .map(ToString::to_string)
            .collect();
        if !booked.is_empty() {
            return Err(BookingError::SeatsAlreadyBooked { seats: booked });
        }

        let unavailable: Vec<String> = request
            .seat_ids
            .iter()
            .filter(|&seat| {
                profile.permanently_unavailable.contains(seat) || !profile.contains(seat)
            })
            .map(ToString::to_string)
            .collect();
        if !unavailable.is_empty() {
            return Err(BookingError::SeatsUnavailable {
                seats: unavailable,
            });
        }

        let hold_id = HoldId::new();
        match self
            .coordinator
            .acquire_seats(
                request.show_id,
                user_id,
                hold_id,
                &request.seat_ids,
                self.config.hold_ttl,
            )
            .await?
        {
            AcquireOutcome::Acquired { .. } => {}
            AcquireOutcome::Conflict { seat } => {
                return Err(BookingError::SeatTaken {
                    seat: seat.to_string(),
                });
            }
        }

        let now = Utc::now();
        let hold = Hold {
            hold_id,
            show_id: request.show_id,
            user_id: user_id.clone(),
            seat_ids: request.seat_ids.clone(),
            status: HoldStatus::Held,
            created_at: now,
            expires_at: now + self.config.hold_ttl,
        };

        if let Err(e) = self.coordinator.put_hold(&hold, self.config.hold_ttl).await {
            tracing::error!(
                hold_id = %hold_id,
                show_id = %request.show_id,
                error = %e,
                "Failed to store hold; releasing seat locks"
            );
            if let Err(comp) = self
                .coordinator
                .release_seats(request.show_id, user_id, &request.seat_ids)
                .await
            {
                tracing::error!(
                    hold_id = %hold_id,
                    error = %comp,
                    "Compensation failed; seats stay locked until TTL"
                );
            }
            return Err(e);
        }

        self.invalidate_seatmap(request.show_id).await;
        self.emit(BookingEvent::HoldCreated(HoldEventData {
            hold_id,
            user_id: user_id.clone(),
            show_id: request.show_id,
            seat_ids: hold.seat_ids.clone(),
            expires_at: hold.expires_at,
            movie_title: show.movie_title.clone(),
            theatre_name: show.theatre_name.clone(),
        }))
        .await;

        tracing::info!(
            hold_id = %hold_id,
            user_id = %user_id,
            show_id = %request.show_id,
            seat_count = hold.seat_ids.len(),
            "Hold created"
        );

        Ok(hold)
    }

    /// Fetch a hold, projecting `EXPIRED` when its TTL has lapsed.
    ///
    /// Read-only: never mutates state.
    ///
    /// # Errors
    ///
    /// [`BookingError::HoldNotFound`] on miss, [`BookingError::Forbidden`]
    /// on an ownership mismatch, or a transient coordinator error.
    pub async fn get_hold(&self, user_id: &UserId, hold_id: HoldId) -> Result<Hold> {
        let mut hold = self
            .coordinator
            .get_hold(hold_id)
            .await?
            .ok_or(BookingError::HoldNotFound)?;

        if &hold.user_id != user_id {
            return Err(BookingError::Forbidden);
        }

        hold.status = hold.effective_status(Utc::now());
        Ok(hold)
    }

    /// Release a hold and unlock its seats.
    ///
    /// # Errors
    ///
    /// Lookup/ownership errors as for [`Self::get_hold`];
    /// [`BookingError::HoldAlreadyReleased`] or [`BookingError::HoldExpired`]
    /// when the hold cannot be released; transient coordinator errors.
    pub async fn release_hold(&self, user_id: &UserId, hold_id: HoldId) -> Result<ReleasedHold> {
        let hold = self
            .coordinator
            .get_hold(hold_id)
            .await?
            .ok_or(BookingError::HoldNotFound)?;

        if &hold.user_id != user_id {
            return Err(BookingError::Forbidden);
        }
        if hold.status == HoldStatus::Released {
            return Err(BookingError::HoldAlreadyReleased);
        }

        let now = Utc::now();
        if now > hold.expires_at {
            // The lapse is observed here, on the write path; announce it.
            self.emit_hold_expired(&hold).await;
            return Err(BookingError::HoldExpired);
        }

        let released_seats = self
            .coordinator
            .release_seats(hold.show_id, user_id, &hold.seat_ids)
            .await?;

        let mut released = hold.clone();
        released.status = HoldStatus::Released;
        self.coordinator
            .put_hold(&released, hold.expires_at - now)
            .await?;

        self.invalidate_seatmap(hold.show_id).await;
        self.emit(BookingEvent::HoldReleased(HoldReleasedData {
            hold_id,
            user_id: user_id.clone(),
            show_id: hold.show_id,
            seat_ids: hold.seat_ids.clone(),
            released_seats: released_seats.clone(),
        }))
        .await;

        tracing::info!(
            hold_id = %hold_id,
            user_id = %user_id,
            released_count = released_seats.len(),
            "Hold released"
        );

        Ok(ReleasedHold {
            hold: released,
            released_seats,
        })
    }

    /// Convert a hold into a pending order.
    ///
    /// Persists the order, deletes the hold, and refreshes the seat locks to
    /// the payment window so seats stay reserved while the user pays. If the
    /// order insert fails the hold is restored with its residual TTL, so a
    /// retry sees an intact hold; the seat locks were never touched.
    ///
    /// # Errors
    ///
    /// Validation, lookup, ownership, [`BookingError::HoldNotHeld`],
    /// [`BookingError::HoldExpired`], or transient store errors.
    pub async fn create_order(
        &self,
        user_id: &UserId,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails> {
        utils::validate_user_id(user_id.as_str())?;
        request.customer.validate()?;

        let hold = self
            .coordinator
            .get_hold(request.hold_id)
            .await?
            .ok_or(BookingError::HoldNotFound)?;

        if &hold.user_id != user_id {
            return Err(BookingError::Forbidden);
        }
        if hold.status != HoldStatus::Held {
            return Err(BookingError::HoldNotHeld {
                status: hold.status,
            });
        }

        let now = Utc::now();
        if now > hold.expires_at {
            self.emit_hold_expired(&hold).await;
            return Err(BookingError::HoldExpired);
        }

        let show = self
            .repository
            .show_by_id(hold.show_id)
            .await?
            .ok_or(BookingError::ShowNotFound)?;

        #[allow(clippy::cast_precision_loss)]
        let amount = hold.seat_ids.len() as f64 * show.price;
        let order = Order {
            order_id: OrderId::new(),
            user_id: user_id.clone(),
            show_id: hold.show_id,
            seat_ids: hold.seat_ids.clone(),
            customer: request.customer.clone(),
            amount,
            status: OrderStatus::PaymentPending,
            ticket_code: None,
            created_at: now,
            expires_at: now + self.config.order_ttl,
            updated_at: now,
        };

        if let Err(e) = self.repository.create_order(&order).await {
            tracing::error!(
                hold_id = %request.hold_id,
                order_id = %order.order_id,
                error = %e,
                "Failed to persist order; restoring hold"
            );
            if let Err(comp) = self.coordinator.put_hold(&hold, hold.expires_at - now).await {
                tracing::error!(
                    hold_id = %request.hold_id,
                    error = %comp,
                    "Compensation failed; hold record may be stale"
                );
            }
            return Err(e);
        }

        // The hold is consumed; its seat locks stay and now cover the
        // payment window instead of the hold TTL.
        if let Err(e) = self.coordinator.delete_hold(request.hold_id).await {
            tracing::warn!(
                hold_id = %request.hold_id,
                error = %e,
                "Hold record not deleted; it will lapse at TTL"
            );
        }
        match self
            .coordinator
            .acquire_seats(
                hold.show_id,
                user_id,
                hold.hold_id,
                &hold.seat_ids,
                self.config.order_ttl,
            )
            .await
        {
            Ok(AcquireOutcome::Acquired { .. }) => {}
            Ok(AcquireOutcome::Conflict { seat }) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    seat = %seat,
                    "Seat lock refresh lost a race; locks keep their original TTL"
                );
            }
            Err(e) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    error = %e,
                    "Seat lock refresh failed; locks keep their original TTL"
                );
            }
        }

        self.invalidate_seatmap(hold.show_id).await;
        self.emit(BookingEvent::OrderCreated(OrderCreatedData {
            order_id: order.order_id,
            user_id: user_id.clone(),
            show_id: hold.show_id,
            seat_ids: order.seat_ids.clone(),
            amount,
            customer: order.customer.clone(),
            expires_at: order.expires_at,
            movie_title: show.movie_title.clone(),
            theatre_name: show.theatre_name.clone(),
        }))
        .await;

        tracing::info!(
            order_id = %order.order_id,
            hold_id = %request.hold_id,
            user_id = %user_id,
            amount = amount,
            "Order created"
        );

        Ok(OrderDetails { order, show })
    }

    /// Fetch an order with its show context, projecting `EXPIRED` when the
    /// payment window has lapsed. Read-only.
    ///
    /// # Errors
    ///
    /// [`BookingError::OrderNotFound`], [`BookingError::Forbidden`], or a
    /// transient store error.
    pub async fn get_order(&self, user_id: &UserId, order_id: OrderId) -> Result<OrderDetails> {
        let mut order = self
            .repository
            .order_by_id(order_id)
            .await?
            .ok_or(BookingError::OrderNotFound)?;

        if &order.user_id != user_id {
            return Err(BookingError::Forbidden);
        }

        let show = self
            .repository
            .show_by_id(order.show_id)
            .await?
            .ok_or(BookingError::ShowNotFound)?;

        order.status = order.effective_status(Utc::now());
        Ok(OrderDetails { order, show })
    }

    /// Confirm payment for a pending order.
    ///
    /// The durable compare-and-set is the commit point: it succeeds at most
    /// once per order. The seat locks were protecting the payment window and
    /// are released afterwards; confirmation supersedes them.
    ///
    /// # Errors
    ///
    /// Lookup/ownership errors, [`BookingError::OrderNotPending`],
    /// [`BookingError::OrderExpired`], or transient store errors.
    pub async fn confirm_payment(
        &self,
        user_id: &UserId,
        order_id: OrderId,
    ) -> Result<OrderDetails> {
        let order = self
            .repository
            .order_by_id(order_id)
            .await?
            .ok_or(BookingError::OrderNotFound)?;

        if &order.user_id != user_id {
            return Err(BookingError::Forbidden);
        }
        if order.status != OrderStatus::PaymentPending {
            return Err(BookingError::OrderNotPending {
                status: order.status,
            });
        }

        let now = Utc::now();
        if now > order.expires_at {
            return Err(BookingError::OrderExpired);
        }

        let show = self
            .repository
            .show_by_id(order.show_id)
            .await?
            .ok_or(BookingError::ShowNotFound)?;

        let ticket_code = order.order_id.ticket_code();
        if !self
            .repository
            .confirm_order_payment(&order, &ticket_code)
            .await?
        {
            // Someone else transitioned the row between our read and the
            // compare-and-set. Re-read and report the state that won.
            let current = self
                .repository
                .order_by_id(order_id)
                .await?
                .ok_or(BookingError::OrderNotFound)?;
            return Err(BookingError::OrderNotPending {
                status: current.effective_status(now),
            });
        }

        if let Err(e) = self
            .coordinator
            .release_seats(order.show_id, user_id, &order.seat_ids)
            .await
        {
            tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Seat locks not released after confirmation; they lapse at TTL"
            );
        }

        self.invalidate_seatmap(order.show_id).await;

        let mut confirmed = order;
        confirmed.status = OrderStatus::Confirmed;
        confirmed.ticket_code = Some(ticket_code.clone());
        confirmed.updated_at = now;

        self.emit(BookingEvent::OrderConfirmed(OrderConfirmedData {
            order_id,
            user_id: user_id.clone(),
            show_id: confirmed.show_id,
            seat_ids: confirmed.seat_ids.clone(),
            amount: confirmed.amount,
            ticket_code,
            customer: confirmed.customer.clone(),
            show_time: show.start_time,
            movie_title: show.movie_title.clone(),
            theatre_name: show.theatre_name.clone(),
        }))
        .await;

        self.check_sold_out(&show).await;

        tracing::info!(
            order_id = %order_id,
            user_id = %user_id,
            "Payment confirmed"
        );

        Ok(OrderDetails {
            order: confirmed,
            show,
        })
    }

    /// Emit `show.sold_out` if no sellable seat remains. Best-effort.
    async fn check_sold_out(&self, show: &Show) {
        let profile = self.config.profile_for(&show.theatre_id);
        match self.repository.confirmed_seats(show.show_id).await {
            Ok(confirmed) => {
                if confirmed.len() >= profile.sellable_capacity() {
                    self.emit(BookingEvent::ShowSoldOut(ShowSoldOutData {
                        show_id: show.show_id,
                        movie_title: show.movie_title.clone(),
                        theatre_name: show.theatre_name.clone(),
                        start_time: show.start_time,
                    }))
                    .await;
                }
            }
            Err(e) => {
                tracing::debug!(show_id = %show.show_id, error = %e, "Sold-out check skipped");
            }
        }
    }

    /// Announce a lapsed hold observed on a write path. Best-effort.
    async fn emit_hold_expired(&self, hold: &Hold) {
        let (movie_title, theatre_name) = match self.repository.show_by_id(hold.show_id).await {
            Ok(Some(show)) => (show.movie_title, show.theatre_name),
            _ => (String::new(), String::new()),
        };
        self.emit(BookingEvent::HoldExpired(HoldEventData {
            hold_id: hold.hold_id,
            user_id: hold.user_id.clone(),
            show_id: hold.show_id,
            seat_ids: hold.seat_ids.clone(),
            expires_at: hold.expires_at,
            movie_title,
            theatre_name,
        }))
        .await;
    }

    /// Publish an event, logging instead of failing on error.
    async fn emit(&self, event: BookingEvent) {
        if let Err(e) = self.events.publish(&event).await {
            tracing::warn!(
                event_type = event.event_type(),
                error = %e,
                "Failed to publish event"
            );
        }
    }

    /// Drop the cached seatmap, logging instead of failing on error.
    async fn invalidate_seatmap(&self, show_id: ShowId) {
        if let Err(e) = self.coordinator.invalidate_seatmap(show_id).await {
            tracing::warn!(
                show_id = %show_id,
                error = %e,
                "Failed to invalidate seatmap cache"
            );
        }
    }
}
