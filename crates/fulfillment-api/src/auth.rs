//! Bearer credential extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use fulfillment_core::identity::CallerIdentity;

use crate::error::ApiError;

/// Extractor for the caller's bearer credential. Rejects the request with
/// 401 when the `Authorization` header is missing or not a bearer token.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(CallerIdentity::from_authorization_header)
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}
