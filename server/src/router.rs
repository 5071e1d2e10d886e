//! Router configuration.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, holds, orders, seatmap};
use crate::state::AppState;

/// Build the Axum router over the reservation core.
///
/// CORS is wide open: the booking API is fronted by browsers on arbitrary
/// origins, and identity travels in the `x-user-id` header rather than
/// cookies.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/shows/:show_id/seatmap", get(seatmap::get_seatmap))
        .route("/holds", post(holds::create_hold))
        .route("/holds/:hold_id", get(holds::get_hold))
        .route("/holds/:hold_id/release", post(holds::release_hold))
        .route("/orders", post(orders::create_order))
        .route("/orders/:order_id", get(orders::get_order))
        .route(
            "/orders/:order_id/confirm-payment",
            post(orders::confirm_payment),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
