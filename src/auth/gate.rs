//! Credential checks and token-to-user resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::error::AuthError;
use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::auth::user_store::UserStore;
use crate::db::UserRecord;

/// Decides who a request belongs to.
#[derive(Clone)]
pub struct AuthGate {
    store: UserStore,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(store: UserStore, hasher: Arc<PasswordHasher>, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Check a username/password pair.
    ///
    /// Returns `Ok(None)` both for unknown users and for wrong passwords so
    /// callers cannot tell the two apart. `Err` is reserved for store
    /// failures.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let user = self
            .store
            .get_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let Some(user) = user else {
            debug!(username, "Login for unknown user");
            return Ok(None);
        };

        let matches = self
            .hasher
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await;
        if !matches {
            warn!(username, "Login with wrong password");
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Resolve a bearer token to the user it names.
    ///
    /// The token only proves who it was issued to. If that user has been
    /// deleted since, the result is `UserNotFound`; nothing revokes the
    /// token itself.
    pub async fn resolve_current_user(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .store
            .get_by_username(&claims.sub)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::UserNotFound(claims.sub.clone()))?;

        debug!(username = %user.username, "Token resolved");
        Ok(user)
    }
}
