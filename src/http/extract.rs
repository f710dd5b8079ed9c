//! Request extractors for the HTTP API.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use super::error::AppError;
use super::state::AppState;
use crate::auth::{self, AuthenticatedUser};

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header on every request that takes it.
///
/// Rejections are 401s: a missing or malformed header, an unknown token
/// or an expired session all fail here before the handler runs.
pub struct CurrentUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;
        let user = auth::authenticate(state.repository.as_ref(), token).await?;
        Ok(CurrentUser(user))
    }
}

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
