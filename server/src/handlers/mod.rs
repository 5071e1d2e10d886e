//! HTTP request handlers.

pub mod health;
pub mod holds;
pub mod orders;
pub mod seatmap;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path segment as a UUID, mirroring the domain's 400 messages.
fn parse_uuid(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::bad_request(format!("Invalid {what} format")))
}
