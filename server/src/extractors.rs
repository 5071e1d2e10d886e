//! Custom Axum extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use boxoffice_booking::{utils, UserId};

use crate::error::ApiError;

/// The calling user, taken from the `x-user-id` header.
///
/// Stands in for a decoded authentication token: the gateway in front of
/// this service verifies the token and forwards the subject here. Requests
/// without the header are rejected with 401; malformed identifiers with 400.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?;

        let user_id = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid x-user-id header"))?;
        utils::validate_user_id(user_id)?;

        Ok(Self(UserId::new(user_id.to_string())))
    }
}
