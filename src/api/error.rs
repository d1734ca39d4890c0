//! Mapping of domain errors onto HTTP responses.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::accounts::AccountError;
use crate::auth::AuthError;

/// Error returned by every handler and extractor in the API.
#[derive(Debug)]
pub enum ApiError {
    Account(AccountError),
    Auth(AuthError),
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        Self::Account(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "detail": message })),
    )
        .into_response()
}

fn internal(err: &dyn std::fmt::Display) -> Response {
    tracing::error!("Request failed: {}", err);
    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Account(err) => match err {
                AccountError::InvalidCredentials => unauthorized("Incorrect username or password"),
                AccountError::DuplicateUsername(_) => {
                    detail(StatusCode::BAD_REQUEST, "User already registered")
                }
                AccountError::NotFound(_) => detail(StatusCode::NOT_FOUND, "User not found"),
                AccountError::InvalidInput(msg) => detail(StatusCode::UNPROCESSABLE_ENTITY, &msg),
                AccountError::Database(_) | AccountError::Internal(_) => internal(&err),
            },
            Self::Auth(err) => match err {
                AuthError::MissingToken => unauthorized("Not authenticated"),
                AuthError::InvalidToken(_) | AuthError::Expired | AuthError::UserNotFound(_) => {
                    tracing::debug!("Bearer token rejected: {}", err);
                    unauthorized("Could not validate credentials")
                }
                AuthError::Internal(_) => internal(&err),
            },
        }
    }
}
