//! Caller identity extraction.
//!
//! The platform's authentication middleware stores an `AuthContext` in the
//! request extensions; handlers that require identity extract a [`Caller`].

use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use certis_core::{AppError, AuthContext};

/// Required authenticated caller. Rejects with 401 when the middleware did
/// not attach an identity.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "missing authentication context".to_string(),
                ))
            })
    }
}
