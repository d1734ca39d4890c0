//! Account operations: registration, login and self-service CRUD.
//!
//! An `AccountService` is cheap to build and is created per request around a
//! fresh `UserStore`, so every request works against its own store handle
//! and releases it when the request ends.

mod error;
mod models;

pub use error::{AccountError, AccountResult};
pub use models::{MessageResponse, RegisterRequest, User, UserUpdate};

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::{AccessToken, AuthError, AuthGate, PasswordHasher, TokenService, UserStore};
use crate::db::{FieldUpdate, UserCreate, UserPatch, UserRecord};
use crate::types::{UserId, Username};

pub struct AccountService {
    store: UserStore,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(store: UserStore, hasher: Arc<PasswordHasher>, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn gate(&self) -> AuthGate {
        AuthGate::new(self.store.clone(), self.hasher.clone(), self.tokens.clone())
    }

    /// Register a new user.
    ///
    /// The username check here is advisory: it gives the common case a clean
    /// `DuplicateUsername`, while the store's unique index settles races.
    pub async fn register(&self, request: RegisterRequest) -> AccountResult<User> {
        let username = validate_username(&request.username)?;
        validate_password(&request.password)?;

        if self.store.get_by_username(username.as_str()).await?.is_some() {
            return Err(AccountError::DuplicateUsername(username.into_inner()));
        }

        let password_hash = self.hasher.hash_blocking(request.password).await?;
        let record = self
            .store
            .create(&UserCreate {
                id: UserId::generate(),
                username,
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
            })
            .await?;

        info!(user_id = %record.id, username = %record.username, "User registered");
        Ok(record.into())
    }

    /// Check credentials and issue an access token for the user.
    pub async fn login(&self, username: &str, password: &str) -> AccountResult<AccessToken> {
        let user = self
            .gate()
            .authenticate(username, password)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?
            .ok_or(AccountError::InvalidCredentials)?;

        let token = self.tokens.issue(user.username.as_str())?;
        debug!(username = %user.username, "Access token issued");
        Ok(token)
    }

    /// Resolve a bearer token to the stored user it names.
    pub async fn resolve_current_user(&self, token: &str) -> Result<UserRecord, AuthError> {
        self.gate().resolve_current_user(token).await
    }

    pub async fn get_user(&self, id: &UserId) -> AccountResult<User> {
        self.store
            .get_by_id(id)
            .await?
            .map(User::from)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    pub async fn list_users(&self) -> AccountResult<Vec<User>> {
        let users = self.store.list_all().await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    /// Apply a partial update. A new password is hashed before it reaches
    /// the store.
    pub async fn update_user(&self, id: &UserId, update: UserUpdate) -> AccountResult<User> {
        let username = match update.username {
            FieldUpdate::Unchanged => None,
            FieldUpdate::Clear => {
                return Err(AccountError::InvalidInput(
                    "username cannot be cleared".to_string(),
                ));
            }
            FieldUpdate::Set(name) => Some(validate_username(&name)?),
        };

        let password_hash = match update.password {
            FieldUpdate::Unchanged => None,
            FieldUpdate::Clear => {
                return Err(AccountError::InvalidInput(
                    "password cannot be cleared".to_string(),
                ));
            }
            FieldUpdate::Set(password) => {
                validate_password(&password)?;
                Some(self.hasher.hash_blocking(password).await?)
            }
        };

        if let Some(name) = &username
            && let Some(holder) = self.store.get_by_username(name.as_str()).await?
            && &holder.id != id
        {
            return Err(AccountError::DuplicateUsername(name.to_string()));
        }

        let patch = UserPatch {
            username,
            first_name: update.first_name,
            last_name: update.last_name,
            password_hash,
        };

        let record = self.store.update(id, &patch).await?;
        info!(user_id = %record.id, "User updated");
        Ok(record.into())
    }

    pub async fn delete_user(&self, id: &UserId) -> AccountResult<()> {
        self.store.delete(id).await?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

fn validate_password(password: &str) -> AccountResult<()> {
    if !PasswordHasher::accepts(password) {
        return Err(AccountError::InvalidInput(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

fn validate_username(raw: &str) -> AccountResult<Username> {
    if raw.trim().is_empty() {
        return Err(AccountError::InvalidInput(
            "username must not be empty".to_string(),
        ));
    }
    Ok(Username::new(raw))
}
