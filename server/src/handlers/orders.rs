//! Order handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_booking::{
    CreateOrderRequest, Customer, HoldId, OrderDetails, OrderId, OrderStatus, SeatId, ShowId,
};

use super::parse_uuid;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use crate::state::AppState;

/// `POST /orders` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    /// The hold to convert into an order.
    pub hold_id: String,
    /// Customer contact details.
    pub customer: CustomerBody,
}

/// Customer details as received on the wire.
#[derive(Debug, Deserialize)]
pub struct CustomerBody {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
}

impl From<CustomerBody> for Customer {
    fn from(body: CustomerBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            phone: body.phone,
        }
    }
}

/// Order representation returned to clients, with denormalized show context.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Order identifier.
    pub order_id: OrderId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Booked seats.
    pub seat_ids: Vec<SeatId>,
    /// Total amount.
    pub amount: f64,
    /// Order status (including the `EXPIRED` projection).
    pub status: OrderStatus,
    /// Customer contact details.
    pub customer: Customer,
    /// Movie title.
    pub movie_title: String,
    /// Theatre name.
    pub theatre_name: String,
    /// Show start time.
    pub show_time: DateTime<Utc>,
    /// Ticket code; present once confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_code: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// End of the payment window.
    pub expires_at: DateTime<Utc>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, show } = details;
        Self {
            order_id: order.order_id,
            show_id: order.show_id,
            seat_ids: order.seat_ids,
            amount: order.amount,
            status: order.status,
            customer: order.customer,
            movie_title: show.movie_title,
            theatre_name: show.theatre_name,
            show_time: show.start_time,
            ticket_code: order.ticket_code,
            created_at: order.created_at,
            expires_at: order.expires_at,
        }
    }
}

/// `POST /orders/{orderId}/confirm-payment` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    /// Order identifier.
    pub order_id: OrderId,
    /// Always `CONFIRMED`.
    pub status: OrderStatus,
    /// The issued ticket code.
    pub ticket_code: String,
    /// Human-readable summary.
    pub message: String,
}

/// `POST /orders`: convert a hold into a pending order.
///
/// # Errors
///
/// 400 validation or expired hold, 403 ownership mismatch, 404 unknown
/// hold/show, 409 wrong hold state, 503 on transient failures.
pub async fn create_order(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Json(body): Json<CreateOrderBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let request = CreateOrderRequest {
        hold_id: HoldId(parse_uuid(&body.hold_id, "hold ID")?),
        customer: body.customer.into(),
    };

    let details = state.reservations.create_order(&user_id, request).await?;
    Ok(Json(details.into()))
}

/// `GET /orders/{orderId}`: the order with its effective status.
///
/// # Errors
///
/// 400 bad id, 403 ownership mismatch, 404 unknown order.
pub async fn get_order(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId(parse_uuid(&order_id, "order ID")?);
    let details = state.reservations.get_order(&user_id, order_id).await?;
    Ok(Json(details.into()))
}

/// `POST /orders/{orderId}/confirm-payment`: finalize the booking.
///
/// # Errors
///
/// 400 bad id or expired order, 403 ownership mismatch, 404 unknown order,
/// 409 wrong order state, 503 on transient failures.
pub async fn confirm_payment(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(order_id): Path<String>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let order_id = OrderId(parse_uuid(&order_id, "order ID")?);
    let details = state
        .reservations
        .confirm_payment(&user_id, order_id)
        .await?;

    let ticket_code = details.order.ticket_code.clone().unwrap_or_default();
    Ok(Json(ConfirmPaymentResponse {
        order_id: details.order.order_id,
        status: details.order.status,
        ticket_code,
        message: "Payment confirmed successfully. Your tickets have been booked!".to_string(),
    }))
}
