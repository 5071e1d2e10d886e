//! Seatmap handler.

use axum::extract::{Path, State};
use axum::Json;
use boxoffice_booking::{Seatmap, ShowId};

use super::parse_uuid;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /shows/{showId}/seatmap`: the composed availability view.
///
/// # Errors
///
/// 400 for a malformed id, 404 for an unknown show, 503 on store failures.
pub async fn get_seatmap(
    State(state): State<AppState>,
    Path(show_id): Path<String>,
) -> Result<Json<Seatmap>, ApiError> {
    let show_id = ShowId(parse_uuid(&show_id, "show ID")?);
    let seatmap = state.availability.get_seatmap(show_id).await?;
    Ok(Json(seatmap))
}
