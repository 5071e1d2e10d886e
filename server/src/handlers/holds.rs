//! Hold handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_booking::{
    CreateHoldRequest, Hold, HoldId, HoldStatus, ReleasedHold, SeatId, ShowId,
};

use super::parse_uuid;
use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use crate::state::AppState;

/// `POST /holds` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHoldBody {
    /// The show to hold seats for.
    pub show_id: String,
    /// Seats to lock.
    pub seat_ids: Vec<String>,
    /// Declared seat count; must match `seatIds`.
    pub quantity: usize,
}

/// Hold representation returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldResponse {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// The show the seats belong to.
    pub show_id: ShowId,
    /// Seats covered by the hold.
    pub seat_ids: Vec<SeatId>,
    /// Hold status (`HELD`, `RELEASED`, or the `EXPIRED` projection).
    pub status: HoldStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl From<Hold> for HoldResponse {
    fn from(hold: Hold) -> Self {
        Self {
            hold_id: hold.hold_id,
            show_id: hold.show_id,
            seat_ids: hold.seat_ids,
            status: hold.status,
            created_at: hold.created_at,
            expires_at: hold.expires_at,
        }
    }
}

/// `POST /holds/{holdId}/release` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseHoldResponse {
    /// Hold identifier.
    pub hold_id: HoldId,
    /// Always `RELEASED`.
    pub status: HoldStatus,
    /// Seats whose locks were actually deleted.
    pub released_seats: Vec<SeatId>,
    /// Human-readable summary.
    pub message: String,
}

/// Decode the seat list, rejecting malformed ids at the boundary.
fn parse_seat_ids(raw: &[String]) -> Result<Vec<SeatId>, ApiError> {
    raw.iter()
        .map(|s| SeatId::parse(s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::from)
}

/// `POST /holds`: lock seats and create a hold.
///
/// # Errors
///
/// 400 validation, 404 unknown show, 409 when a seat is booked or held by
/// someone else, 503 on transient failures.
pub async fn create_hold(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Json(body): Json<CreateHoldBody>,
) -> Result<Json<HoldResponse>, ApiError> {
    let request = CreateHoldRequest {
        show_id: ShowId(parse_uuid(&body.show_id, "show ID")?),
        seat_ids: parse_seat_ids(&body.seat_ids)?,
        quantity: body.quantity,
    };

    let hold = state.reservations.create_hold(&user_id, request).await?;
    Ok(Json(hold.into()))
}

/// `GET /holds/{holdId}`: the hold with its effective status.
///
/// # Errors
///
/// 400 bad id, 403 ownership mismatch, 404 unknown or lapsed hold.
pub async fn get_hold(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(hold_id): Path<String>,
) -> Result<Json<HoldResponse>, ApiError> {
    let hold_id = HoldId(parse_uuid(&hold_id, "hold ID")?);
    let hold = state.reservations.get_hold(&user_id, hold_id).await?;
    Ok(Json(hold.into()))
}

/// `POST /holds/{holdId}/release`: release the hold and unlock its seats.
///
/// # Errors
///
/// 400 bad id / already released / expired, 403 ownership mismatch,
/// 404 unknown hold, 503 on transient failures.
pub async fn release_hold(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(hold_id): Path<String>,
) -> Result<Json<ReleaseHoldResponse>, ApiError> {
    let hold_id = HoldId(parse_uuid(&hold_id, "hold ID")?);
    let ReleasedHold {
        hold,
        released_seats,
    } = state.reservations.release_hold(&user_id, hold_id).await?;

    let message = format!(
        "Hold released. {} seats are now available.",
        released_seats.len()
    );
    Ok(Json(ReleaseHoldResponse {
        hold_id: hold.hold_id,
        status: hold.status,
        released_seats,
        message,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_hold_body_decodes_camel_case() {
        let body: CreateHoldBody = serde_json::from_str(
            r#"{"showId":"550e8400-e29b-41d4-a716-446655440021","seatIds":["A1","A2"],"quantity":2}"#,
        )
        .unwrap();
        assert_eq!(body.seat_ids, ["A1", "A2"]);
        assert_eq!(body.quantity, 2);
    }

    #[test]
    fn malformed_seat_ids_are_rejected_at_the_boundary() {
        let err = parse_seat_ids(&["A1".to_string(), "1A".to_string()]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn hold_response_serializes_camel_case() {
        let hold = Hold {
            hold_id: HoldId::new(),
            show_id: ShowId::new(),
            user_id: boxoffice_booking::UserId::new("user-1".into()),
            seat_ids: vec![SeatId::parse("A1").unwrap()],
            status: HoldStatus::Held,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };
        let json = serde_json::to_value(HoldResponse::from(hold)).unwrap();
        assert_eq!(json["status"], "HELD");
        assert!(json.get("holdId").is_some());
        assert!(json.get("expiresAt").is_some());
        // The owner is implied by the authenticated caller, never echoed.
        assert!(json.get("userId").is_none());
    }
}
