//! Request extractors for per-request store sessions and bearer tokens.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::accounts::AccountService;
use crate::api::AppState;
use crate::api::error::ApiError;
use crate::auth::AuthError;
use crate::db::UserRecord;

/// Account service bound to a store handle owned by this request.
pub struct Accounts(pub AccountService);

impl FromRequestParts<AppState> for Accounts {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Accounts(state.accounts()))
    }
}

/// Raw bearer token from the `Authorization` header.
///
/// Only checks that a token is present. Use [`CurrentUser`] when the
/// token must be valid.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        parse_bearer(header_value)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// The stored user named by a valid, unexpired bearer token.
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.accounts().resolve_current_user(&token).await?;
        Ok(CurrentUser(user))
    }
}

/// Split `Bearer <token>`, accepting the scheme in any case.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
