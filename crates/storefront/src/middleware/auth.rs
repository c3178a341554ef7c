//! Authentication extractor.
//!
//! Cart routes require `Authorization: Bearer <token>`. The token is resolved
//! to a user through the state's [`IdentityResolver`](crate::services::auth::IdentityResolver);
//! handlers only ever see the resolved [`CurrentUser`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use wardrobe_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The authenticated shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with `401 {"message": ...}` when the header is missing, is not a
/// bearer credential, or names an unknown or revoked token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

        let user_id = state
            .identity()
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_string()))?;

        Span::current().record("user_id", user_id.as_i32());
        set_sentry_user(&user_id);

        Ok(Self(CurrentUser { id: user_id }))
    }
}

/// Extract the credential from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
