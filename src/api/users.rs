//! Account and user endpoints.

use axum::{
    Form, Json,
    extract::Path,
    http::StatusCode,
};
use serde::Deserialize;

use crate::accounts::{MessageResponse, RegisterRequest, User, UserUpdate};
use crate::api::error::ApiError;
use crate::api::extract::{Accounts, BearerToken, CurrentUser};
use crate::auth::AccessToken;
use crate::types::UserId;

pub const UPDATED_MESSAGE: &str =
    "Data has been modified. If you changed password or username, authorize again";
pub const DELETED_MESSAGE: &str = "Account has been deleted. Register a new one if you want";
pub const DELETED_SELF_MESSAGE: &str =
    "Your account has been deleted. Register a new one or login as an existing";

/// OAuth2 password-flow login form. Extra fields such as `grant_type` and
/// `scope` are accepted and ignored.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /register/
#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn register(
    Accounts(accounts): Accounts,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = accounts.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login/
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    Accounts(accounts): Accounts,
    Form(form): Form<LoginForm>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = accounts.login(&form.username, &form.password).await?;
    Ok(Json(token))
}

/// GET /users/
#[tracing::instrument(skip_all)]
pub async fn list_users(
    _token: BearerToken,
    Accounts(accounts): Accounts,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(accounts.list_users().await?))
}

/// GET /users/{id}/
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn get_user(
    _token: BearerToken,
    Accounts(accounts): Accounts,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(accounts.get_user(&UserId::new(id)).await?))
}

/// GET /user/me/
#[tracing::instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user.into())
}

/// PATCH /user/me/edit/
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    Accounts(accounts): Accounts,
    CurrentUser(user): CurrentUser,
    Json(update): Json<UserUpdate>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    accounts.update_user(&user.id, update).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(UPDATED_MESSAGE))))
}

/// DELETE /users/{id}/delete/
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn delete_user(
    _token: BearerToken,
    Accounts(accounts): Accounts,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    accounts.delete_user(&UserId::new(id)).await?;
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}

/// DELETE /user/me/delete/
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_me(
    Accounts(accounts): Accounts,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    accounts.delete_user(&user.id).await?;
    Ok(Json(MessageResponse::new(DELETED_SELF_MESSAGE)))
}
