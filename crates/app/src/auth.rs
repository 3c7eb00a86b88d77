use axum::{extract::FromRequestParts, http::request::Parts};
use study_core::model::UserId;

use crate::error::ApiError;

/// Header set by the upstream auth gateway.
pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, taken from [`USER_HEADER`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| UserId::new(value))
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated)
    }
}
